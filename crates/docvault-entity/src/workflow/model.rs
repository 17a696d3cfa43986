//! Document workflow entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use super::data::WorkflowData;
use super::status::{WorkflowStatus, WorkflowType};

/// A mutable workflow record gating a document.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentWorkflow {
    /// Unique workflow identifier.
    pub id: Uuid,
    /// The gated document.
    pub document_id: Uuid,
    /// Kind of workflow.
    pub workflow_type: WorkflowType,
    /// Current status.
    pub status: WorkflowStatus,
    /// Assigned reviewer.
    pub assignee_id: Option<Uuid>,
    /// Deadline for a decision.
    pub due_date: Option<DateTime<Utc>>,
    /// When a terminal state was reached.
    pub completed_at: Option<DateTime<Utc>>,
    /// Decision rationale or expiry note.
    pub notes: Option<String>,
    /// Typed workflow details.
    pub workflow_data: Json<WorkflowData>,
    /// When the workflow was created.
    pub created_at: DateTime<Utc>,
    /// When the workflow was last changed.
    pub updated_at: DateTime<Utc>,
}

impl DocumentWorkflow {
    /// Whether the workflow is overdue at `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_terminal() && self.due_date.is_some_and(|due| due < now)
    }
}

/// Data required to open a workflow.
#[derive(Debug, Clone)]
pub struct CreateWorkflow {
    /// The gated document.
    pub document_id: Uuid,
    /// Kind of workflow.
    pub workflow_type: WorkflowType,
    /// Initial assignee.
    pub assignee_id: Option<Uuid>,
    /// Deadline for a decision.
    pub due_date: Option<DateTime<Utc>>,
    /// Typed details.
    pub workflow_data: WorkflowData,
}

impl CreateWorkflow {
    /// Materialise a `pending` workflow row.
    pub fn into_workflow(self, now: DateTime<Utc>) -> DocumentWorkflow {
        DocumentWorkflow {
            id: Uuid::new_v4(),
            document_id: self.document_id,
            workflow_type: self.workflow_type,
            status: WorkflowStatus::Pending,
            assignee_id: self.assignee_id,
            due_date: self.due_date,
            completed_at: None,
            notes: None,
            workflow_data: Json(self.workflow_data),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_overdue_only_when_open() {
        let now = Utc::now();
        let mut workflow = CreateWorkflow {
            document_id: Uuid::new_v4(),
            workflow_type: WorkflowType::Approval,
            assignee_id: None,
            due_date: Some(now - Duration::hours(1)),
            workflow_data: WorkflowData::Compliance {
                requirement: "ndis-screening".to_string(),
            },
        }
        .into_workflow(now - Duration::days(8));
        assert!(workflow.is_overdue(now));

        workflow.status = WorkflowStatus::Approved;
        assert!(!workflow.is_overdue(now));

        workflow.status = WorkflowStatus::Pending;
        workflow.due_date = None;
        assert!(!workflow.is_overdue(now));
    }
}
