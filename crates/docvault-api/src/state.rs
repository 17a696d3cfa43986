//! Application state shared across all handlers.

use std::sync::Arc;

use docvault_core::config::AppConfig;
use docvault_core::traits::storage::ContentStore;
use docvault_database::DatabasePool;
use docvault_service::Services;

/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Every domain service
    pub services: Services,
    /// Content store, for health reporting
    pub content: Arc<dyn ContentStore>,
    /// PostgreSQL pool, absent when running on the in-memory store
    pub db_pool: Option<DatabasePool>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        services: Services,
        content: Arc<dyn ContentStore>,
        db_pool: Option<DatabasePool>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            services,
            content,
            db_pool,
        }
    }
}
