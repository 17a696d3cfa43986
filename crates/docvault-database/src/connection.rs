//! PostgreSQL pool for the document, version, and workflow tables.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};

use docvault_core::config::DatabaseConfig;
use docvault_core::error::{AppError, ErrorKind};

/// Shared handle to the PostgreSQL pool backing [`crate::Stores::postgres`].
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Connect, retrying with a linear backoff up to `connect_attempts` times.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let target = redact_url(&config.url);
        let attempts = config.connect_attempts.max(1);

        let mut attempt = 1;
        loop {
            match pool_options(config).connect(&config.url).await {
                Ok(pool) => {
                    info!(
                        database = %target,
                        max_connections = config.max_connections,
                        attempt,
                        "Document store connected"
                    );
                    return Ok(Self { pool });
                }
                Err(e) if attempt < attempts => {
                    warn!(database = %target, attempt, error = %e, "Database not reachable yet");
                    tokio::time::sleep(Duration::from_secs(u64::from(attempt))).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(AppError::with_source(
                        ErrorKind::Database,
                        format!("Could not reach {target} after {attempts} attempt(s)"),
                        e,
                    ));
                }
            }
        }
    }

    /// The underlying sqlx pool, for repositories and migrations.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip a trivial query; used by the health endpoint.
    pub async fn health_check(&self) -> Result<bool, AppError> {
        let one: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Database ping failed", e))?;
        Ok(one == 1)
    }

    /// Wait for checked-out connections to return, then close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!(idle = self.pool.num_idle(), "Document store disconnected");
    }
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections.min(config.max_connections))
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
}

/// Replace the credentials of a connection URL with `***`.
fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.rsplit_once('@') {
        Some((credentials, host)) => {
            let user = credentials.split(':').next().unwrap_or_default();
            format!("{scheme}://{user}:***@{host}")
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_url_hides_password() {
        assert_eq!(
            redact_url("postgres://docvault:hunter2@db:5432/docvault"),
            "postgres://docvault:***@db:5432/docvault"
        );
    }

    #[test]
    fn test_redact_url_without_credentials() {
        assert_eq!(
            redact_url("postgres://localhost:5432/docvault"),
            "postgres://localhost:5432/docvault"
        );
        assert_eq!(redact_url("not a url"), "not a url");
    }
}
