//! Domain events emitted by DocVault operations.
//!
//! Events are published on the in-process [`EventBus`] after the
//! corresponding state change has committed, and consumed by the external
//! notifier (email/SMS delivery lives outside this repository).

pub mod bus;
pub mod document;
pub mod workflow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use bus::EventBus;
pub use document::DocumentEvent;
pub use workflow::WorkflowEvent;

/// Wrapper for all domain events with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The actor who caused the event (None for scheduled jobs).
    pub actor_id: Option<Uuid>,
    /// The event payload.
    pub payload: EventPayload,
}

/// Union of all domain event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event")]
pub enum EventPayload {
    /// A document or version-chain event.
    Document(DocumentEvent),
    /// An approval workflow event.
    Workflow(WorkflowEvent),
}

impl DomainEvent {
    /// Create a new domain event.
    pub fn new(actor_id: Option<Uuid>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            actor_id,
            payload,
        }
    }

    /// Create a document-domain event.
    pub fn document(actor_id: Option<Uuid>, event: DocumentEvent) -> Self {
        Self::new(actor_id, EventPayload::Document(event))
    }

    /// Create a workflow-domain event.
    pub fn workflow(actor_id: Option<Uuid>, event: WorkflowEvent) -> Self {
        Self::new(actor_id, EventPayload::Workflow(event))
    }
}
