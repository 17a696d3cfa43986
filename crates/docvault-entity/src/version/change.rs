//! Typed change metadata stored alongside each version.
//!
//! Persisted as JSONB. The wire shape is a flat object keyed by
//! `change_type`, e.g.
//!
//! ```json
//! {"change_type":"rollback","rolled_back_to_version":1,"rollback_reason":"bad scan",
//!  "storage_key":"documents/…/versions/…","file_size_change":-12,
//!  "reason":"bad scan","changed_by":"…","changed_at":"…"}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// A single field that changed between two versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Field name.
    pub field: String,
    /// Value before the change.
    pub old_value: Value,
    /// Value after the change.
    pub new_value: Value,
}

impl FieldChange {
    /// Build a field change record.
    pub fn new(field: impl Into<String>, old_value: Value, new_value: Value) -> Self {
        Self {
            field: field.into(),
            old_value,
            new_value,
        }
    }
}

/// Variant-specific change details, keyed by `change_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change_type", rename_all = "snake_case")]
pub enum ChangeMetadata {
    /// First version of a document.
    Initial {
        /// Content key the bytes were stored under.
        storage_key: String,
        /// Size of the initial content.
        file_size_change: i64,
    },
    /// New content replacing the previous head.
    FileUpdate {
        /// Content key the bytes were stored under.
        storage_key: String,
        /// Signed size difference from the previous head.
        file_size_change: i64,
        /// Content-level fields that changed.
        #[serde(default)]
        affected_fields: Vec<FieldChange>,
    },
    /// Descriptive fields changed; content is shared with the predecessor.
    MetadataUpdate {
        /// Fields that changed, with old and new values.
        affected_fields: Vec<FieldChange>,
    },
    /// Content restored from an earlier version.
    Rollback {
        /// Version number whose content was restored.
        rolled_back_to_version: i32,
        /// Why the rollback was performed.
        rollback_reason: String,
        /// Content key of the restored bytes.
        storage_key: String,
        /// Signed size difference from the previous head.
        file_size_change: i64,
        /// Content-level fields that changed.
        #[serde(default)]
        affected_fields: Vec<FieldChange>,
    },
}

impl ChangeMetadata {
    /// The discriminant of this change.
    pub fn change_type(&self) -> ChangeType {
        match self {
            Self::Initial { .. } => ChangeType::Initial,
            Self::FileUpdate { .. } => ChangeType::FileUpdate,
            Self::MetadataUpdate { .. } => ChangeType::MetadataUpdate,
            Self::Rollback { .. } => ChangeType::Rollback,
        }
    }

    /// Fields listed as changed (empty for `initial`).
    pub fn affected_fields(&self) -> &[FieldChange] {
        match self {
            Self::Initial { .. } => &[],
            Self::FileUpdate {
                affected_fields, ..
            }
            | Self::MetadataUpdate { affected_fields }
            | Self::Rollback {
                affected_fields, ..
            } => affected_fields,
        }
    }
}

/// A complete change record: the typed details plus who/when/why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Variant-specific details.
    #[serde(flatten)]
    pub change: ChangeMetadata,
    /// Free-text reason supplied by the actor.
    #[serde(default)]
    pub reason: Option<String>,
    /// The actor who made the change.
    pub changed_by: Uuid,
    /// When the change was made.
    pub changed_at: DateTime<Utc>,
}

impl ChangeRecord {
    /// Build a record stamped with the current time.
    pub fn new(change: ChangeMetadata, reason: Option<String>, changed_by: Uuid) -> Self {
        Self {
            change,
            reason,
            changed_by,
            changed_at: Utc::now(),
        }
    }

    /// The discriminant of this change.
    pub fn change_type(&self) -> ChangeType {
        self.change.change_type()
    }
}

/// Recognised change types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// First version.
    Initial,
    /// Content replaced.
    FileUpdate,
    /// Descriptive fields changed.
    MetadataUpdate,
    /// Earlier content restored.
    Rollback,
}

impl ChangeType {
    /// Return the change type as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::FileUpdate => "file_update",
            Self::MetadataUpdate => "metadata_update",
            Self::Rollback => "rollback",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
