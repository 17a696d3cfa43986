//! # docvault-database
//!
//! Persistence for DocVault. The [`store`] module defines the storage seam
//! used by the services; [`repositories`] implements it on PostgreSQL and
//! [`memory`] implements it in process memory with the same conditional
//! update semantics.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use store::{DocumentStore, Stores, VersionCommit, VersionStore, WorkflowStore};
