//! Cron scheduler for the periodic retention and expiry jobs.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use docvault_core::config::AppConfig;
use docvault_core::error::AppError;
use docvault_service::Services;

use crate::executor::JobExecutor;
use crate::jobs::{RETENTION_SWEEP, RetentionSweepHandler, WORKFLOW_EXPIRY, WorkflowExpiryHandler};

/// Fires registered jobs on their cron schedules.
///
/// A job whose previous run is still in flight skips its next tick, so
/// runs of the same job never overlap.
pub struct CronScheduler {
    scheduler: JobScheduler,
    executor: Arc<JobExecutor>,
    cancel: watch::Receiver<bool>,
    in_flight: Vec<(String, Arc<Mutex<()>>)>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler")
            .field("jobs", &self.executor.registered_types())
            .finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new(
        executor: Arc<JobExecutor>,
        cancel: watch::Receiver<bool>,
    ) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            executor,
            cancel,
            in_flight: Vec::new(),
        })
    }

    /// Build the executor with the retention and expiry handlers, and
    /// schedule both from configuration.
    pub async fn with_default_jobs(
        services: &Services,
        config: &AppConfig,
        cancel: watch::Receiver<bool>,
    ) -> Result<Self, AppError> {
        let mut executor = JobExecutor::new();
        executor.register(Arc::new(RetentionSweepHandler::new(services.retention.clone())));
        executor.register(Arc::new(WorkflowExpiryHandler::new(services.workflows.clone())));

        let mut scheduler = Self::new(Arc::new(executor), cancel).await?;
        scheduler
            .schedule(RETENTION_SWEEP, &config.retention.sweep_schedule)
            .await?;
        scheduler
            .schedule(WORKFLOW_EXPIRY, &config.workflow.expiry_schedule)
            .await?;

        tracing::info!("All scheduled tasks registered");
        Ok(scheduler)
    }

    /// Run `job_type` on a six-field cron schedule.
    pub async fn schedule(&mut self, job_type: &str, cron: &str) -> Result<(), AppError> {
        if !self.executor.has_handler(job_type) {
            return Err(AppError::configuration(format!(
                "No handler registered for job type '{job_type}'"
            )));
        }

        let executor = Arc::clone(&self.executor);
        let cancel = self.cancel.clone();
        let lock = Arc::new(Mutex::new(()));
        let name = job_type.to_string();

        let job_lock = Arc::clone(&lock);
        let job = CronJob::new_async(cron, move |_uuid, _scheduler| {
            let executor = Arc::clone(&executor);
            let cancel = cancel.clone();
            let lock = Arc::clone(&job_lock);
            let name = name.clone();
            Box::pin(async move {
                if *cancel.borrow() {
                    return;
                }
                let Ok(_guard) = lock.try_lock() else {
                    tracing::debug!(job_type = %name, "Previous run still in flight, skipping");
                    return;
                };
                match executor.execute(&name, &cancel).await {
                    Ok(result) => tracing::debug!(job_type = %name, %result, "Job completed"),
                    Err(e) if e.is_transient() => {
                        tracing::warn!(job_type = %name, error = %e, "Job failed, will retry next run")
                    }
                    Err(e) => tracing::error!(job_type = %name, error = %e, "Job failed"),
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid schedule '{cron}' for {job_type}: {e}"))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add {job_type} schedule: {e}")))?;

        self.in_flight.push((job_type.to_string(), lock));
        tracing::info!(job_type = %job_type, schedule = %cron, "Registered scheduled job");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Stop firing new runs and wait up to `drain` for in-flight runs.
    ///
    /// In-flight jobs observe the cancellation signal between documents and
    /// finish the document they are on.
    pub async fn shutdown(&self, drain: Duration) -> Result<(), AppError> {
        let mut scheduler = self.scheduler.clone();
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        for (job_type, lock) in &self.in_flight {
            if tokio::time::timeout(drain, lock.lock()).await.is_err() {
                tracing::warn!(job_type = %job_type, "Job still running after drain timeout");
            }
        }

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// Job types with a schedule.
    pub fn scheduled_jobs(&self) -> Vec<&str> {
        self.in_flight.iter().map(|(name, _)| name.as_str()).collect()
    }
}
