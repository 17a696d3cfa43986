//! Acting identity passed into every mutating service call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who is performing an operation.
///
/// Resolved upstream (the auth gateway sets it on the request) and passed
/// into service methods so every recorded change names its actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorContext {
    /// The acting user's ID.
    pub actor_id: Uuid,
    /// The role the user is acting under, if supplied.
    pub role: Option<String>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl ActorContext {
    /// Creates a new actor context.
    pub fn new(actor_id: Uuid, role: Option<String>) -> Self {
        Self {
            actor_id,
            role,
            request_time: Utc::now(),
        }
    }
}
