//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every field carries a default so an empty file is valid.

pub mod app;
pub mod database;
pub mod logging;
pub mod retention;
pub mod storage;
pub mod worker;
pub mod workflow;

use serde::{Deserialize, Serialize};

pub use self::app::ServerConfig;
pub use self::database::DatabaseConfig;
pub use self::logging::{LogFormat, LoggingConfig};
pub use self::retention::{MAX_KEEP_DAYS, RetentionConfig};
pub use self::storage::StorageConfig;
pub use self::worker::WorkerConfig;
pub use self::workflow::WorkflowConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Content store settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Version retention defaults.
    #[serde(default)]
    pub retention: RetentionConfig,
    /// Approval workflow settings.
    #[serde(default)]
    pub workflow: WorkflowConfig,
    /// Background worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Event bus settings.
    #[serde(default)]
    pub events: EventsConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// In-process event bus configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Capacity of the broadcast channel; slow subscribers lag beyond this.
    #[serde(default = "default_event_capacity")]
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_event_capacity(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `DOCVAULT__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("DOCVAULT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field and range constraints serde cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        self.retention.validate()
    }
}

fn default_event_capacity() -> usize {
    1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.retention.keep_recent, 5);
        assert_eq!(config.retention.milestone_interval, 10);
        assert_eq!(config.workflow.approval_due_days, 7);
        assert!(config.database.url.is_empty());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"retention": {"keep_days": 90}}"#).unwrap();
        assert_eq!(config.retention.keep_days, 90);
        assert_eq!(config.retention.keep_recent, 5);
        assert_eq!(config.events.channel_capacity, 1024);
    }

    #[test]
    fn test_out_of_range_retention_fails_validation() {
        let config: AppConfig =
            serde_json::from_str(r#"{"retention": {"keep_days": 9223372036854775807}}"#).unwrap();
        assert!(config.validate().is_err());
    }
}
