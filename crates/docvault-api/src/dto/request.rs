//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use docvault_entity::document::{CreateDocument, MetadataUpdate};
use docvault_service::RetentionPolicy;

/// The `metadata` part of a registration upload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterDocumentRequest {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Category is required"))]
    pub category: String,
    /// Defaults to the acting user.
    pub owner_id: Option<Uuid>,
    #[serde(default)]
    pub requires_approval: bool,
    pub assignee_id: Option<Uuid>,
    #[validate(length(min = 1, max = 100))]
    pub required_role: Option<String>,
}

impl RegisterDocumentRequest {
    /// Convert into the service input.
    pub fn into_create(self, actor_id: Uuid, mime_type: Option<String>) -> CreateDocument {
        CreateDocument {
            title: self.title,
            description: self.description,
            category: self.category,
            owner_id: self.owner_id.unwrap_or(actor_id),
            mime_type,
            requires_approval: self.requires_approval,
            assignee_id: self.assignee_id,
            required_role: self.required_role,
        }
    }
}

/// Body of `PATCH /documents/{id}/metadata`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateMetadataRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    /// An empty string clears the description.
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 500))]
    pub summary: Option<String>,
}

impl UpdateMetadataRequest {
    pub fn into_parts(self) -> (MetadataUpdate, Option<String>) {
        (
            MetadataUpdate {
                title: self.title,
                category: self.category,
                description: self.description,
            },
            self.summary,
        )
    }
}

/// Body of `POST /documents/{id}/rollback`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RollbackRequest {
    pub target_version_id: Uuid,
    #[validate(length(min = 1, max = 1000, message = "A rollback reason is required"))]
    pub reason: String,
}

/// Query of `GET /documents/{id}/compare`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareQuery {
    pub a: Uuid,
    pub b: Uuid,
}

/// Optional overrides for a single cleanup run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CleanupRequest {
    #[validate(range(max = 1000))]
    pub keep_recent: Option<usize>,
    #[validate(range(min = 0, max = 36500))]
    pub keep_days: Option<i64>,
    #[validate(range(min = 0))]
    pub milestone_interval: Option<i32>,
}

impl CleanupRequest {
    /// Overlay the overrides on the configured policy.
    pub fn policy(&self, defaults: RetentionPolicy) -> RetentionPolicy {
        RetentionPolicy {
            keep_recent: self.keep_recent.unwrap_or(defaults.keep_recent),
            keep_days: self.keep_days.unwrap_or(defaults.keep_days),
            milestone_interval: self.milestone_interval.unwrap_or(defaults.milestone_interval),
        }
    }
}

/// Body of `POST /workflows/{id}/start`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartReviewRequest {
    /// Defaults to the acting user.
    pub assignee_id: Option<Uuid>,
}

/// Body of `POST /workflows/{id}/decision`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DecisionRequest {
    /// `approved` or `rejected`.
    #[validate(length(min = 1))]
    pub decision: String,
    #[validate(length(max = 2000))]
    pub comments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::validate;

    #[test]
    fn test_cleanup_overrides_fall_back_to_defaults() {
        let defaults = RetentionPolicy {
            keep_recent: 5,
            keep_days: 30,
            milestone_interval: 10,
        };
        let request = CleanupRequest {
            keep_recent: Some(1),
            ..Default::default()
        };
        let policy = request.policy(defaults);
        assert_eq!(policy.keep_recent, 1);
        assert_eq!(policy.keep_days, 30);
        assert_eq!(policy.milestone_interval, 10);
    }

    #[test]
    fn test_blank_rollback_reason_fails_validation() {
        let request = RollbackRequest {
            target_version_id: Uuid::new_v4(),
            reason: String::new(),
        };
        assert!(validate(&request).is_err());
    }

    #[test]
    fn test_owner_defaults_to_actor() {
        let actor = Uuid::new_v4();
        let request: RegisterDocumentRequest =
            serde_json::from_str(r#"{"title":"Plan","category":"ndis_plan"}"#).unwrap();
        let create = request.into_create(actor, None);
        assert_eq!(create.owner_id, actor);
        assert!(!create.requires_approval);
    }
}
