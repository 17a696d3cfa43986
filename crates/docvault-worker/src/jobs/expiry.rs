//! Scheduled expiry of overdue approval workflows.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::watch;

use docvault_service::WorkflowService;

use super::WORKFLOW_EXPIRY;
use crate::executor::{JobExecutionError, JobHandler};

/// Moves open workflows past their due date to `expired`.
#[derive(Debug)]
pub struct WorkflowExpiryHandler {
    workflows: WorkflowService,
}

impl WorkflowExpiryHandler {
    pub fn new(workflows: WorkflowService) -> Self {
        Self { workflows }
    }
}

#[async_trait]
impl JobHandler for WorkflowExpiryHandler {
    fn job_type(&self) -> &str {
        WORKFLOW_EXPIRY
    }

    async fn execute(&self, cancel: &watch::Receiver<bool>) -> Result<Value, JobExecutionError> {
        let report = self
            .workflows
            .expire_overdue(Utc::now(), cancel)
            .await
            .map_err(JobExecutionError::classify)?;

        if !report.expired.is_empty() {
            tracing::info!(
                expired = report.expired.len(),
                skipped = report.skipped,
                "Expired overdue workflows"
            );
        }

        Ok(serde_json::json!({
            "task": WORKFLOW_EXPIRY,
            "expired": report.expired.len(),
            "skipped": report.skipped,
            "cancelled": report.cancelled,
        }))
    }
}
