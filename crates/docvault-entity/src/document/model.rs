//! Document entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use uuid::Uuid;

use super::status::DocumentStatus;
use crate::version::change::FieldChange;

/// A logical document tracked by DocVault.
///
/// `current_version_id` is the explicit head pointer of the version chain;
/// `version` mirrors the head's version number.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    /// Unique document identifier.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Category label (e.g. "certification", "service_agreement").
    pub category: String,
    /// The owning user.
    pub owner_id: Uuid,
    /// Lifecycle status.
    pub status: DocumentStatus,
    /// Version number of the head version (0 before the first version).
    pub version: i32,
    /// ID of the head version.
    pub current_version_id: Option<Uuid>,
    /// Content store key of the head version's bytes.
    pub content_key: Option<String>,
    /// SHA-256 of the head version's bytes.
    pub content_hash: Option<String>,
    /// Size of the head version's bytes.
    pub size_bytes: i64,
    /// MIME type of the head version.
    pub mime_type: Option<String>,
    /// When the document was registered.
    pub created_at: DateTime<Utc>,
    /// When the document was last changed.
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Whether the document has at least one version.
    pub fn has_versions(&self) -> bool {
        self.current_version_id.is_some()
    }
}

/// Data required to register a new document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocument {
    /// Display title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Category label.
    pub category: String,
    /// The owning user.
    pub owner_id: Uuid,
    /// MIME type of the initial content.
    pub mime_type: Option<String>,
    /// Whether activation must wait for an approval decision.
    #[serde(default)]
    pub requires_approval: bool,
    /// Reviewer to assign up front, if any.
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
    /// Role an approver is expected to hold, recorded on the workflow.
    #[serde(default)]
    pub required_role: Option<String>,
}

/// Requested changes to a document's descriptive fields.
///
/// `None` leaves a field untouched. An empty description clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataUpdate {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New category.
    #[serde(default)]
    pub category: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
}

impl MetadataUpdate {
    /// Compute the fields that would actually change on `document`.
    pub fn diff(&self, document: &Document) -> Vec<FieldChange> {
        let mut changes = Vec::new();

        if let Some(title) = &self.title {
            if *title != document.title {
                changes.push(FieldChange::new("title", json!(document.title), json!(title)));
            }
        }

        if let Some(category) = &self.category {
            if *category != document.category {
                changes.push(FieldChange::new(
                    "category",
                    json!(document.category),
                    json!(category),
                ));
            }
        }

        if let Some(description) = &self.description {
            let next = Some(description.as_str()).filter(|d| !d.is_empty());
            if next != document.description.as_deref() {
                changes.push(FieldChange::new(
                    "description",
                    json!(document.description),
                    json!(next),
                ));
            }
        }

        changes
    }

    /// Apply the update to an in-memory document.
    pub fn apply(&self, document: &mut Document) {
        if let Some(title) = &self.title {
            document.title = title.clone();
        }
        if let Some(category) = &self.category {
            document.category = category.clone();
        }
        if let Some(description) = &self.description {
            document.description = Some(description.clone()).filter(|d| !d.is_empty());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let now = Utc::now();
        Document {
            id: Uuid::new_v4(),
            title: "Worker screening".to_string(),
            description: Some("NDIS clearance".to_string()),
            category: "compliance".to_string(),
            owner_id: Uuid::new_v4(),
            status: DocumentStatus::Active,
            version: 1,
            current_version_id: Some(Uuid::new_v4()),
            content_key: Some("documents/x/versions/abc".to_string()),
            content_hash: Some("abc".to_string()),
            size_bytes: 3,
            mime_type: Some("application/pdf".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_diff_reports_only_changed_fields() {
        let doc = sample();
        let update = MetadataUpdate {
            title: Some("Worker screening".to_string()),
            category: Some("hr".to_string()),
            description: None,
        };
        let changes = update.diff(&doc);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "category");
        assert_eq!(changes[0].old_value, json!("compliance"));
        assert_eq!(changes[0].new_value, json!("hr"));
    }

    #[test]
    fn test_empty_description_clears() {
        let mut doc = sample();
        let update = MetadataUpdate {
            description: Some(String::new()),
            ..Default::default()
        };
        let changes = update.diff(&doc);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].new_value, serde_json::Value::Null);

        update.apply(&mut doc);
        assert!(doc.description.is_none());
        assert!(update.diff(&doc).is_empty());
    }
}
