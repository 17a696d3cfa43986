//! Approval workflow services.

pub mod service;

pub use service::{ExpiryReport, WorkflowService};
