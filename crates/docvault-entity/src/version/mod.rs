//! Document version domain entities.

pub mod change;
pub mod model;

pub use change::{ChangeMetadata, ChangeRecord, ChangeType, FieldChange};
pub use model::{DocumentVersion, NewVersion};
