//! Structural comparison of two versions of the same document.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_entity::version::{ChangeType, DocumentVersion};

/// Compact view of one side of a comparison.
#[derive(Debug, Clone, Serialize)]
pub struct VersionSummary {
    pub id: Uuid,
    pub version_number: i32,
    pub content_hash: String,
    pub size_bytes: i64,
    pub is_metadata_only: bool,
    pub change_type: Option<ChangeType>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<&DocumentVersion> for VersionSummary {
    fn from(v: &DocumentVersion) -> Self {
        Self {
            id: v.id,
            version_number: v.version_number,
            content_hash: v.content_hash.clone(),
            size_bytes: v.size_bytes,
            is_metadata_only: v.is_metadata_only,
            change_type: v.change_type(),
            created_by: v.created_by,
            created_at: v.created_at,
        }
    }
}

/// Comparison of the change metadata carried by both versions.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeComparison {
    pub change_type_a: ChangeType,
    pub change_type_b: ChangeType,
    pub same_change_type: bool,
    /// Affected field names recorded only on A.
    pub fields_only_in_a: Vec<String>,
    /// Affected field names recorded only on B.
    pub fields_only_in_b: Vec<String>,
    /// Affected field names recorded on both.
    pub common_fields: Vec<String>,
}

/// Delta between version A and version B. Signed values are `b - a`.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub document_id: Uuid,
    pub version_a: VersionSummary,
    pub version_b: VersionSummary,
    pub size_delta: i64,
    pub elapsed_seconds: i64,
    pub creators_differ: bool,
    pub content_changed: bool,
    /// Present only when both versions carry change metadata.
    pub changes: Option<ChangeComparison>,
}

/// Compare two versions. Both must belong to the same document.
pub fn compare(a: &DocumentVersion, b: &DocumentVersion) -> AppResult<Comparison> {
    if a.document_id != b.document_id {
        return Err(AppError::not_found(format!(
            "Versions {} and {} belong to different documents",
            a.id, b.id
        )));
    }

    let changes = match (a.change(), b.change()) {
        (Some(ca), Some(cb)) => {
            let fields_a: BTreeSet<&str> = ca
                .change
                .affected_fields()
                .iter()
                .map(|f| f.field.as_str())
                .collect();
            let fields_b: BTreeSet<&str> = cb
                .change
                .affected_fields()
                .iter()
                .map(|f| f.field.as_str())
                .collect();
            Some(ChangeComparison {
                change_type_a: ca.change_type(),
                change_type_b: cb.change_type(),
                same_change_type: ca.change_type() == cb.change_type(),
                fields_only_in_a: fields_a.difference(&fields_b).map(|s| s.to_string()).collect(),
                fields_only_in_b: fields_b.difference(&fields_a).map(|s| s.to_string()).collect(),
                common_fields: fields_a.intersection(&fields_b).map(|s| s.to_string()).collect(),
            })
        }
        _ => None,
    };

    Ok(Comparison {
        document_id: a.document_id,
        version_a: a.into(),
        version_b: b.into(),
        size_delta: b.size_bytes - a.size_bytes,
        elapsed_seconds: (b.created_at - a.created_at).num_seconds(),
        creators_differ: a.created_by != b.created_by,
        content_changed: a.content_hash != b.content_hash,
        changes,
    })
}
