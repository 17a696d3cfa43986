//! Content store configuration.

use serde::{Deserialize, Serialize};

/// Which content store backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentBackend {
    /// Files under a local root directory.
    Local,
    /// Process memory; contents are lost on restart.
    Memory,
}

/// Top-level content store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend to use.
    #[serde(default = "default_backend")]
    pub backend: ContentBackend,
    /// Root path for the local backend.
    #[serde(default = "default_local_root")]
    pub local_root: String,
    /// Maximum accepted size of a single document version, in bytes.
    #[serde(default = "default_max_content")]
    pub max_content_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            local_root: default_local_root(),
            max_content_bytes: default_max_content(),
        }
    }
}

fn default_backend() -> ContentBackend {
    ContentBackend::Local
}

fn default_local_root() -> String {
    "./data/content".to_string()
}

fn default_max_content() -> u64 {
    52_428_800 // 50 MB
}
