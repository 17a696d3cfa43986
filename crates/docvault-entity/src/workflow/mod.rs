//! Approval workflow domain entities.

pub mod data;
pub mod model;
pub mod status;

pub use data::WorkflowData;
pub use model::{CreateWorkflow, DocumentWorkflow};
pub use status::{WorkflowStatus, WorkflowType};
