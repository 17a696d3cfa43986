//! Document domain entities.

pub mod model;
pub mod status;

pub use model::{CreateDocument, Document, MetadataUpdate};
pub use status::DocumentStatus;
