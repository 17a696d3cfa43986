//! # docvault-storage
//!
//! Content store implementations for DocVault (local filesystem and
//! in-memory), plus the SHA-256 fingerprinting and key layout used by the
//! version chain.

pub mod hash;
pub mod keys;
pub mod providers;

use std::sync::Arc;

use docvault_core::config::storage::{ContentBackend, StorageConfig};
use docvault_core::result::AppResult;
use docvault_core::traits::storage::ContentStore;
use tracing::info;

pub use hash::{HashedContent, hash_bytes, hash_stream};
pub use providers::{LocalContentStore, MemoryContentStore};

/// Build the configured content store.
pub async fn build_content_store(config: &StorageConfig) -> AppResult<Arc<dyn ContentStore>> {
    let store: Arc<dyn ContentStore> = match config.backend {
        ContentBackend::Local => Arc::new(LocalContentStore::new(&config.local_root).await?),
        ContentBackend::Memory => Arc::new(MemoryContentStore::new()),
    };
    info!(backend = store.provider_type(), "Content store initialized");
    Ok(store)
}
