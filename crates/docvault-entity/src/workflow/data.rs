//! Typed workflow data stored as JSONB.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Per-type workflow details, keyed by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkflowData {
    /// Approval gate on an upload.
    Approval {
        /// Actor who submitted the document.
        requested_by: Uuid,
        /// Version number under review.
        version_number: i32,
        /// Role an approver must hold, if restricted.
        #[serde(default)]
        required_role: Option<String>,
        /// Caller-supplied extras.
        #[serde(default)]
        extra: Value,
    },
    /// Periodic review of an active document.
    Review {
        /// Actor who requested the review.
        requested_by: Uuid,
        /// Version number under review.
        version_number: i32,
        /// Caller-supplied extras.
        #[serde(default)]
        extra: Value,
    },
    /// Expiry tracking.
    Expiry {
        /// When the underlying document lapses.
        document_expires_at: DateTime<Utc>,
    },
    /// Compliance check.
    Compliance {
        /// Requirement identifier.
        requirement: String,
    },
}

impl WorkflowData {
    /// The role required of an approver, if any.
    pub fn required_role(&self) -> Option<&str> {
        match self {
            Self::Approval { required_role, .. } => required_role.as_deref(),
            _ => None,
        }
    }

    /// The version number under review, if any.
    pub fn version_number(&self) -> Option<i32> {
        match self {
            Self::Approval { version_number, .. } | Self::Review { version_number, .. } => {
                Some(*version_number)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_approval_shape() {
        let data = WorkflowData::Approval {
            requested_by: Uuid::nil(),
            version_number: 1,
            required_role: Some("coordinator".to_string()),
            extra: Value::Null,
        };
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["kind"], "approval");
        assert_eq!(value["required_role"], "coordinator");
        assert_eq!(data.required_role(), Some("coordinator"));
        assert_eq!(data.version_number(), Some(1));
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let data: WorkflowData = serde_json::from_value(json!({
            "kind": "approval",
            "requested_by": Uuid::nil(),
            "version_number": 2
        }))
        .unwrap();
        assert_eq!(data.required_role(), None);
    }
}
