//! faultline-gateway server entry point.
//!
//! Starts the Axum HTTP server, connects the PostgreSQL store and the
//! Redis cache/queue, and runs the single background queue worker.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use faultline_gateway::api;
use faultline_gateway::app_state::AppState;
use faultline_gateway::cache::CacheStore;
use faultline_gateway::cache::redis::RedisCache;
use faultline_gateway::config::GatewayConfig;
use faultline_gateway::persistence::ErrorStore;
use faultline_gateway::persistence::postgres::PostgresErrorStore;
use faultline_gateway::service::{ErrorService, QueueWorker};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting faultline-gateway");

    // Durable store
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await?;
    let store: Arc<dyn ErrorStore> = Arc::new(PostgresErrorStore::new(pool));

    // Cache / work queue
    let cache: Arc<dyn CacheStore> = Arc::new(
        RedisCache::connect(
            &config.redis_url,
            config.recent_ring_capacity,
            Duration::from_secs(config.stats_cache_ttl_secs),
        )
        .await?,
    );

    // Service layer
    let error_service = Arc::new(ErrorService::new(
        Arc::clone(&store),
        Arc::clone(&cache),
        Duration::from_secs(config.list_cache_ttl_secs),
    ));

    // Exactly one queue consumer per process, owned here and stopped via
    // the shutdown signal after the HTTP server drains.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = QueueWorker::new(
        Arc::clone(&store),
        Arc::clone(&cache),
        Duration::from_secs(config.queue_poll_timeout_secs),
    );
    let worker_handle = tokio::spawn(worker.run(shutdown_rx));

    // Build application state
    let app_state = AppState { error_service };

    // Build router
    let app = api::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("server stopped, waiting for queue worker");
    let _ = shutdown_tx.send(true);
    worker_handle.await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
