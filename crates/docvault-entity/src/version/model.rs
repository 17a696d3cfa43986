//! Document version entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use super::change::{ChangeRecord, ChangeType};

/// An immutable snapshot in a document's version chain.
///
/// Only `successor_id` and `superseded_at` are ever written after insert,
/// and each exactly once.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentVersion {
    /// Unique version identifier.
    pub id: Uuid,
    /// The document this version belongs to.
    pub document_id: Uuid,
    /// Per-document sequence number, starting at 1.
    pub version_number: i32,
    /// Version-scoped content store key.
    pub content_key: String,
    /// Size in bytes.
    pub size_bytes: i64,
    /// MIME type of the content.
    pub mime_type: Option<String>,
    /// SHA-256 of the content, lowercase hex.
    pub content_hash: String,
    /// Whether only descriptive fields changed.
    pub is_metadata_only: bool,
    /// Optional free-text summary.
    pub summary: Option<String>,
    /// Structured change details.
    pub change_metadata: Option<Json<ChangeRecord>>,
    /// User who created this version.
    pub created_by: Uuid,
    /// When this version was created.
    pub created_at: DateTime<Utc>,
    /// The version that superseded this one.
    pub successor_id: Option<Uuid>,
    /// When this version was superseded.
    pub superseded_at: Option<DateTime<Utc>>,
}

impl DocumentVersion {
    /// Whether this version is the head of its chain.
    pub fn is_head(&self) -> bool {
        self.successor_id.is_none()
    }

    /// The structured change record, if present.
    pub fn change(&self) -> Option<&ChangeRecord> {
        self.change_metadata.as_ref().map(|json| &json.0)
    }

    /// The change type, if change metadata is present.
    pub fn change_type(&self) -> Option<ChangeType> {
        self.change().map(ChangeRecord::change_type)
    }

    /// Whether this version was produced by a rollback.
    pub fn is_rollback(&self) -> bool {
        self.change_type() == Some(ChangeType::Rollback)
    }
}

/// A version ready to be committed; the store assigns `version_number`.
#[derive(Debug, Clone)]
pub struct NewVersion {
    /// Pre-generated identifier.
    pub id: Uuid,
    /// Owning document.
    pub document_id: Uuid,
    /// Version-scoped content store key.
    pub content_key: String,
    /// Size in bytes.
    pub size_bytes: i64,
    /// MIME type.
    pub mime_type: Option<String>,
    /// SHA-256 of the content.
    pub content_hash: String,
    /// Whether only descriptive fields changed.
    pub is_metadata_only: bool,
    /// Optional summary.
    pub summary: Option<String>,
    /// Structured change details.
    pub change: ChangeRecord,
    /// Creating actor.
    pub created_by: Uuid,
}

impl NewVersion {
    /// Materialise the row with its allocated number.
    pub fn into_version(self, version_number: i32, created_at: DateTime<Utc>) -> DocumentVersion {
        DocumentVersion {
            id: self.id,
            document_id: self.document_id,
            version_number,
            content_key: self.content_key,
            size_bytes: self.size_bytes,
            mime_type: self.mime_type,
            content_hash: self.content_hash,
            is_metadata_only: self.is_metadata_only,
            summary: self.summary,
            change_metadata: Some(Json(self.change)),
            created_by: self.created_by,
            created_at,
            successor_id: None,
            superseded_at: None,
        }
    }
}
