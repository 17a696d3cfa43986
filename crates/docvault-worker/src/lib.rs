//! Background work for DocVault.
//!
//! This crate provides:
//! - A job executor that dispatches named jobs to their handlers
//! - A cron scheduler that fires the jobs and drains them on shutdown
//! - The retention sweep and the approval expiry scan

pub mod executor;
pub mod jobs;
pub mod scheduler;

pub use executor::{JobExecutionError, JobExecutor, JobHandler};
pub use scheduler::CronScheduler;
