//! Append-only approval decision record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::document::DocumentStatus;
use crate::workflow::WorkflowStatus;

/// Outcome of an approval decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "approval_decision", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalDecision {
    /// The document may become active.
    Approved,
    /// The document is rejected.
    Rejected,
}

impl ApprovalDecision {
    /// Workflow status this decision moves to.
    pub fn workflow_status(&self) -> WorkflowStatus {
        match self {
            Self::Approved => WorkflowStatus::Approved,
            Self::Rejected => WorkflowStatus::Rejected,
        }
    }

    /// Document status this decision moves to.
    pub fn document_status(&self) -> DocumentStatus {
        match self {
            Self::Approved => DocumentStatus::Active,
            Self::Rejected => DocumentStatus::Rejected,
        }
    }

    /// Return the decision as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApprovalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ApprovalDecision {
    type Err = docvault_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "approved" | "approve" => Ok(Self::Approved),
            "rejected" | "reject" => Ok(Self::Rejected),
            _ => Err(docvault_core::AppError::validation(format!(
                "Invalid decision: '{s}'. Expected 'approved' or 'rejected'"
            ))),
        }
    }
}

/// A recorded decision. Never updated after insert.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentApproval {
    /// Unique approval identifier.
    pub id: Uuid,
    /// The workflow decided.
    pub workflow_id: Uuid,
    /// The document decided.
    pub document_id: Uuid,
    /// Who decided.
    pub approver_id: Uuid,
    /// Role the approver acted under.
    pub approver_role: Option<String>,
    /// The outcome.
    pub decision: ApprovalDecision,
    /// Rationale.
    pub comments: Option<String>,
    /// When the decision was made.
    pub decided_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_targets() {
        assert_eq!(ApprovalDecision::Approved.workflow_status(), WorkflowStatus::Approved);
        assert_eq!(ApprovalDecision::Approved.document_status(), DocumentStatus::Active);
        assert_eq!(ApprovalDecision::Rejected.workflow_status(), WorkflowStatus::Rejected);
        assert_eq!(ApprovalDecision::Rejected.document_status(), DocumentStatus::Rejected);
        assert_eq!("reject".parse::<ApprovalDecision>().unwrap(), ApprovalDecision::Rejected);
    }
}
