//! DocVault Server: document version control and approval workflows.
//!
//! Main entry point that wires all crates together and starts the server.

use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use docvault_api::AppState;
use docvault_core::config::{AppConfig, LogFormat};
use docvault_core::error::AppError;
use docvault_core::events::EventBus;
use docvault_database::{DatabasePool, Stores};
use docvault_service::Services;
use docvault_worker::CronScheduler;

#[tokio::main]
async fn main() {
    let env = std::env::var("DOCVAULT_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting DocVault v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Stores ───────────────────────────────────────────
    let (stores, db_pool) = if config.database.is_configured() {
        let pool = DatabasePool::connect(&config.database).await?;
        if config.database.run_migrations {
            tracing::info!("Running database migrations...");
            docvault_database::migration::run_migrations(pool.pool()).await?;
        }
        (Stores::postgres(pool.pool().clone()), Some(pool))
    } else {
        tracing::warn!("No database URL configured, using the in-memory store");
        (Stores::memory(), None)
    };

    // ── Step 2: Content store ────────────────────────────────────
    let content = docvault_storage::build_content_store(&config.storage).await?;
    tracing::info!(provider = content.provider_type(), "Content store ready");

    // ── Step 3: Services ─────────────────────────────────────────
    let events = EventBus::new(config.events.channel_capacity);
    let services = Services::new(stores, content.clone(), events, &config);

    // ── Step 4: Background jobs ──────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = if config.worker.enabled {
        let scheduler =
            CronScheduler::with_default_jobs(&services, &config, shutdown_rx.clone()).await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    // ── Step 5: HTTP server ──────────────────────────────────────
    let drain = Duration::from_secs(config.worker.drain_timeout_seconds);
    let state = AppState::new(config, services, content, db_pool.clone());

    let mut server_shutdown = shutdown_rx.clone();
    let signal = tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    docvault_api::run_server(state, async move {
        let _ = server_shutdown.wait_for(|stop| *stop).await;
    })
    .await?;

    // ── Step 6: Drain ────────────────────────────────────────────
    signal.abort();
    if let Some(scheduler) = scheduler {
        scheduler.shutdown(drain).await?;
    }
    if let Some(pool) = db_pool {
        pool.close().await;
    }

    tracing::info!("DocVault stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
