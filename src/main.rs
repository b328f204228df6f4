//! RESTCache - An in-memory key/value cache served over HTTP
//!
//! Binary entry point: loads configuration, restores the newest backup,
//! starts the background tasks and serves the command API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use restcache::api::{builtin_extensions, ExtensionRegistry};
use restcache::cache::{self, CacheStore};
use restcache::{
    create_router, spawn_backup_task, spawn_expiry_task, AppState, BackupManager, CommandGateway,
    Config,
};

/// Main entry point for the RESTCache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache store and restore the newest backup
/// 4. Start the expiry sweep and, if enabled, the backup task
/// 5. Create Axum router with all commands and extensions
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "restcache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting RESTCache server");

    let config = Config::from_env();
    info!(?config, "Configuration loaded");

    let cache = cache::shared(CacheStore::new(config.default_expiry()));
    let backups = Arc::new(BackupManager::new(config.backup_config(), cache.clone()));

    match backups.initialize().await {
        Ok(Some(name)) => info!(backup = %name, "Cache restored at startup"),
        Ok(None) => info!("Starting with an empty cache"),
        Err(e) => error!(error = %e, "Unable to initialize backups, starting with an empty cache"),
    }

    let mut tasks = vec![spawn_expiry_task(
        cache.clone(),
        config.expiry_sweep_interval(),
    )];
    if config.backup_automatic {
        tasks.push(spawn_backup_task(
            backups.clone(),
            backups.config().interval,
        ));
    }
    info!(count = tasks.len(), "Background tasks started");

    let extensions = if config.extensions_enabled {
        builtin_extensions()
    } else {
        ExtensionRegistry::new()
    };
    let gateway = CommandGateway::new(cache, backups, config.command_toggles());
    let app = create_router(AppState::new(gateway, extensions));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Unable to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(tasks))
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then aborts the
/// background tasks.
async fn shutdown_signal(tasks: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    for task in &tasks {
        task.abort();
    }
    warn!(count = tasks.len(), "Background tasks aborted");
}
