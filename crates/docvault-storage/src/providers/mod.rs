//! Content store backends.

pub mod local;
pub mod memory;

pub use local::LocalContentStore;
pub use memory::MemoryContentStore;
