//! Approval workflow events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events related to approval workflow transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkflowEvent {
    /// A workflow was opened in `pending`.
    Created {
        /// The workflow ID.
        workflow_id: Uuid,
        /// The gated document.
        document_id: Uuid,
        /// The assignee, if one was chosen at creation.
        assignee: Option<Uuid>,
    },
    /// A reviewer picked the workflow up.
    Started {
        /// The workflow ID.
        workflow_id: Uuid,
        /// The gated document.
        document_id: Uuid,
        /// The reviewer now assigned.
        assignee: Uuid,
    },
    /// The document was approved and is now active.
    Approved {
        /// The workflow ID.
        workflow_id: Uuid,
        /// The gated document.
        document_id: Uuid,
        /// The approver.
        approver_id: Uuid,
        /// Approver comments.
        comments: Option<String>,
    },
    /// The document was rejected.
    Rejected {
        /// The workflow ID.
        workflow_id: Uuid,
        /// The gated document.
        document_id: Uuid,
        /// The approver.
        approver_id: Uuid,
        /// Approver comments.
        comments: Option<String>,
    },
    /// The workflow passed its due date without a decision.
    Expired {
        /// The workflow ID.
        workflow_id: Uuid,
        /// The gated document.
        document_id: Uuid,
    },
}
