//! Approval workflow configuration.

use serde::{Deserialize, Serialize};

/// Approval workflow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Days from creation until a pending approval is considered overdue.
    #[serde(default = "default_due_days")]
    pub approval_due_days: i64,
    /// Cron expression for the overdue-workflow expiry scan.
    #[serde(default = "default_expiry_schedule")]
    pub expiry_schedule: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            approval_due_days: default_due_days(),
            expiry_schedule: default_expiry_schedule(),
        }
    }
}

fn default_due_days() -> i64 {
    7
}

fn default_expiry_schedule() -> String {
    "0 */15 * * * *".to_string()
}
