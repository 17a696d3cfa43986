//! Document lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "document_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Registered but not yet activated or submitted.
    Draft,
    /// Waiting on an approval workflow.
    PendingApproval,
    /// Approved (or not requiring approval) and in use.
    Active,
    /// Rejected by an approver.
    Rejected,
    /// Replaced by another document.
    Superseded,
}

impl DocumentStatus {
    /// Return the status as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingApproval => "pending_approval",
            Self::Active => "active",
            Self::Rejected => "rejected",
            Self::Superseded => "superseded",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = docvault_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "pending_approval" => Ok(Self::PendingApproval),
            "active" => Ok(Self::Active),
            "rejected" => Ok(Self::Rejected),
            "superseded" => Ok(Self::Superseded),
            _ => Err(docvault_core::AppError::validation(format!(
                "Invalid document status: '{s}'. Expected one of: draft, pending_approval, active, rejected, superseded"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_round_trips_display() {
        for status in [
            DocumentStatus::Draft,
            DocumentStatus::PendingApproval,
            DocumentStatus::Active,
            DocumentStatus::Rejected,
            DocumentStatus::Superseded,
        ] {
            assert_eq!(status.to_string().parse::<DocumentStatus>().unwrap(), status);
        }
        assert!("archived".parse::<DocumentStatus>().is_err());
    }
}
