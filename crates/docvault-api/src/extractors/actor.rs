//! `Actor` extractor: reads the identity the auth gateway put on the request.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use docvault_core::error::AppError;
use docvault_service::ActorContext;

use crate::error::ApiError;

/// Header carrying the acting user's ID.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
/// Header carrying the acting user's role.
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// The acting identity, available in handlers.
#[derive(Debug, Clone)]
pub struct Actor(pub ActorContext);

impl std::ops::Deref for Actor {
    type Target = ActorContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ACTOR_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::validation("Missing X-Actor-Id header"))?;

        let actor_id = Uuid::parse_str(raw.trim())
            .map_err(|_| AppError::validation("X-Actor-Id must be a UUID"))?;

        let role = parts
            .headers
            .get(ACTOR_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(String::from);

        Ok(Actor(ActorContext::new(actor_id, role)))
    }
}
