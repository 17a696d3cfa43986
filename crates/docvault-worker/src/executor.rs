//! Job executor: dispatches jobs to registered handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

use docvault_core::error::{AppError, ErrorKind};

/// A unit of scheduled work.
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// Name the job is registered under.
    fn job_type(&self) -> &str;

    /// Run the job once. Long-running handlers check `cancel` between
    /// units of work.
    async fn execute(&self, cancel: &watch::Receiver<bool>) -> Result<Value, JobExecutionError>;
}

/// Error from job execution
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Permanent failure, retrying will not help
    #[error("Permanent job failure: {0}")]
    Permanent(String),

    /// Transient failure, the next scheduled run may succeed
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

impl JobExecutionError {
    /// Classify a service error by whether a later run could succeed.
    pub fn classify(err: AppError) -> Self {
        match err.kind {
            ErrorKind::Database
            | ErrorKind::Storage
            | ErrorKind::ServiceUnavailable
            | ErrorKind::ConcurrentModification => Self::Transient(err.to_string()),
            ErrorKind::Configuration | ErrorKind::Validation => Self::Permanent(err.to_string()),
            _ => Self::Internal(err),
        }
    }

    /// Whether the next scheduled run is expected to succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Dispatches jobs to the appropriate handler by job type.
#[derive(Debug, Default)]
pub struct JobExecutor {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobExecutor {
    /// Create an executor with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job handler
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        let job_type = handler.job_type().to_string();
        tracing::info!(job_type = %job_type, "Registered job handler");
        self.handlers.insert(job_type, handler);
    }

    /// Run the handler registered for `job_type`.
    pub async fn execute(
        &self,
        job_type: &str,
        cancel: &watch::Receiver<bool>,
    ) -> Result<Value, JobExecutionError> {
        let handler = self.handlers.get(job_type).ok_or_else(|| {
            JobExecutionError::Permanent(format!("No handler registered for job type '{job_type}'"))
        })?;

        tracing::info!(job_type = %job_type, "Executing job");
        handler.execute(cancel).await
    }

    /// Check if a handler is registered for a job type
    pub fn has_handler(&self, job_type: &str) -> bool {
        self.handlers.contains_key(job_type)
    }

    /// Registered job types, sorted.
    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.keys().cloned().collect();
        types.sort();
        types
    }
}
