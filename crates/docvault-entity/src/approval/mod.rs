//! Approval decision entities.

pub mod model;

pub use model::{ApprovalDecision, DocumentApproval};
