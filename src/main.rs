//! Todo Cache - read-through caching in front of a slow JSON source

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todo_cache::{
    create_router, spawn_cleanup_task, AppState, Config, KeyValueStore, MemoryStore, RedisStore,
};

/// Main entry point for the todo cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Connect to Redis, or fall back to the in-memory store with its sweep task
/// 4. Create Axum router with all endpoints
/// 5. Serve until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting todo cache server");

    let config = Config::from_env().context("invalid configuration")?;
    config.validate().context("invalid configuration")?;
    info!(
        port = config.server_port,
        upstream = %config.upstream_url,
        key = %config.cache_key,
        ttl_secs = config.cache_ttl,
        read_policy = %config.read_policy,
        dedupe = config.dedupe_inflight,
        "Configuration loaded"
    );

    let (store, cleanup_handle): (Arc<dyn KeyValueStore>, Option<JoinHandle<()>>) =
        match &config.redis_url {
            Some(url) => {
                let store = RedisStore::connect(url)
                    .await
                    .context("failed to connect to redis")?;
                (Arc::new(store), None)
            }
            None => {
                let store = MemoryStore::new(config.max_entries);
                let handle = spawn_cleanup_task(
                    store.shared(),
                    Duration::from_secs(config.cleanup_interval),
                );
                info!(max_entries = config.max_entries, "Using in-memory store");
                (Arc::new(store), Some(handle))
            }
        };

    let app = create_router(AppState::from_config(&config, store));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the sweep task
/// if one is running.
async fn shutdown_signal(cleanup_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
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

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("Expiry sweep task aborted");
    }
}
