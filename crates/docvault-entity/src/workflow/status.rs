//! Workflow status and type enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a document workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "workflow_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Created, waiting for a reviewer.
    Pending,
    /// A reviewer has picked it up.
    InProgress,
    /// Approved by a decision.
    Approved,
    /// Rejected by a decision.
    Rejected,
    /// Passed its due date without a decision.
    Expired,
}

impl WorkflowStatus {
    /// Check if the workflow is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Expired)
    }

    /// Check if a decision may still be recorded.
    pub fn accepts_decision(&self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    /// Return the status as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WorkflowStatus {
    type Err = docvault_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "expired" => Ok(Self::Expired),
            _ => Err(docvault_core::AppError::validation(format!(
                "Invalid workflow status: '{s}'"
            ))),
        }
    }
}

/// Kind of workflow attached to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "workflow_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WorkflowType {
    /// Gate before activation.
    Approval,
    /// Periodic review.
    Review,
    /// Document expiry tracking.
    Expiry,
    /// Compliance check.
    Compliance,
}

impl WorkflowType {
    /// Return the type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approval => "approval",
            Self::Review => "review",
            Self::Expiry => "expiry",
            Self::Compliance => "compliance",
        }
    }
}

impl fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
