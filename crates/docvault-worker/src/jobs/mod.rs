//! Built-in job handlers.

pub mod expiry;
pub mod retention;

#[cfg(test)]
pub(crate) mod testing;

pub use expiry::WorkflowExpiryHandler;
pub use retention::RetentionSweepHandler;

/// Job type of the retention sweep.
pub const RETENTION_SWEEP: &str = "retention_sweep";
/// Job type of the approval expiry scan.
pub const WORKFLOW_EXPIRY: &str = "workflow_expiry";
