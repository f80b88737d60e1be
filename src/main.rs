//! User Cache - user records served through a cache-aside read path
//!
//! Reads consult an expiring cache before the SQLite store; writes update
//! the store and then invalidate the cached copy.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use user_cache::api::create_router;
use user_cache::cache::{CacheClient, MemoryCache, RedisCache};
use user_cache::store::SqliteStore;
use user_cache::{spawn_cleanup_task, AppState, CacheAside, Config};

/// Main entry point for the user service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the SQLite store, create the table and seed sample users
/// 4. Connect the cache (Redis, or the in-process cache with its purge task)
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "user_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting user service");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, database={}, cache_timeout={}ms, store_timeout={}ms",
        config.server_port,
        config.database_path,
        config.cache_timeout_ms,
        config.store_timeout_ms
    );

    let store = SqliteStore::open(&config.database_path)
        .with_context(|| format!("failed to open database {}", config.database_path))?;
    if config.seed_sample_data {
        store
            .seed_sample_data()
            .await
            .context("failed to seed sample users")?;
    }
    info!("Record store initialized");

    let (cache, cleanup_handle): (Arc<dyn CacheClient>, Option<JoinHandle<()>>) =
        match &config.redis_url {
            Some(url) => {
                let redis = RedisCache::connect(url)
                    .await
                    .with_context(|| format!("failed to connect to Redis at {}", url))?;
                (Arc::new(redis) as Arc<dyn CacheClient>, None)
            }
            None => {
                let memory = MemoryCache::new();
                let handle = spawn_cleanup_task(memory.clone(), config.cleanup_interval);
                info!("REDIS_URL not set, using in-process cache");
                (Arc::new(memory) as Arc<dyn CacheClient>, Some(handle))
            }
        };

    let coordinator = CacheAside::from_config(Arc::new(store), cache, &config);
    let app = create_router(AppState::new(coordinator));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the cleanup task and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
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
        warn!("Cleanup task aborted");
    }
}
