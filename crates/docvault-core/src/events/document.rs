//! Document and version-chain events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events related to documents and their version chains.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DocumentEvent {
    /// A document was registered with its first version.
    Registered {
        /// The document ID.
        document_id: Uuid,
        /// The document title.
        title: String,
        /// Whether activation waits on an approval workflow.
        requires_approval: bool,
    },
    /// A new head version was committed.
    VersionCreated {
        /// The document ID.
        document_id: Uuid,
        /// The new version ID.
        version_id: Uuid,
        /// The new version number.
        version_number: i32,
        /// Whether the version records a metadata-only change.
        is_metadata_only: bool,
    },
    /// A prior version was restored as a new head.
    RolledBack {
        /// The document ID.
        document_id: Uuid,
        /// The version created by the rollback.
        version_id: Uuid,
        /// Its version number.
        version_number: i32,
        /// The version number whose content was restored.
        rolled_back_to_version: i32,
        /// Why the rollback was requested.
        reason: String,
    },
    /// Superseded versions were removed by the retention engine.
    VersionsPruned {
        /// The document ID.
        document_id: Uuid,
        /// Number of version rows deleted.
        deleted_count: u64,
        /// Bytes released from the content store.
        bytes_freed: u64,
    },
}
