//! Scheduled retention sweep over every document.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

use docvault_service::RetentionService;

use super::RETENTION_SWEEP;
use crate::executor::{JobExecutionError, JobHandler};

/// Applies the configured retention policy to all documents.
#[derive(Debug)]
pub struct RetentionSweepHandler {
    retention: RetentionService,
}

impl RetentionSweepHandler {
    pub fn new(retention: RetentionService) -> Self {
        Self { retention }
    }
}

#[async_trait]
impl JobHandler for RetentionSweepHandler {
    fn job_type(&self) -> &str {
        RETENTION_SWEEP
    }

    async fn execute(&self, cancel: &watch::Receiver<bool>) -> Result<Value, JobExecutionError> {
        let policy = self.retention.default_policy();
        let report = self
            .retention
            .sweep(policy, cancel)
            .await
            .map_err(JobExecutionError::classify)?;

        tracing::info!(
            documents = report.documents_processed,
            deleted = report.deleted_count,
            bytes_freed = report.bytes_freed,
            failures = report.failures.len(),
            cancelled = report.cancelled,
            "Retention sweep finished"
        );

        Ok(serde_json::json!({
            "task": RETENTION_SWEEP,
            "documents_processed": report.documents_processed,
            "deleted_versions": report.deleted_count,
            "bytes_freed": report.bytes_freed,
            "failed_documents": report.failures.len(),
            "cancelled": report.cancelled,
        }))
    }
}
