//! PostgreSQL implementations of the store traits.

pub mod document;
pub mod version;
pub mod workflow;

pub use document::DocumentRepository;
pub use version::VersionRepository;
pub use workflow::WorkflowRepository;
