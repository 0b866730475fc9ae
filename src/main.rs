//! Saphari Gateway — IoT device-to-browser message gateway.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use saphari_api::router::build_router;
use saphari_api::state::AppState;
use saphari_auth::access::resolver::CachedAccessResolver;
use saphari_auth::jwt::verifier::JwtVerifier;
use saphari_broker::client::BrokerClient;
use saphari_broker::dispatch::InboundDispatcher;
use saphari_core::config::AppConfig;
use saphari_core::error::AppError;
use saphari_core::traits::AccessResolver;
use saphari_database::DatabasePool;
use saphari_database::repositories::device::DeviceRepository;
use saphari_database::repositories::presence::PresenceRepository;
use saphari_presence::sweeper::spawn_presence_loops;
use saphari_presence::tracker::PresenceTracker;
use saphari_realtime::bridge::MessageBridge;
use saphari_realtime::engine::RealtimeEngine;

#[tokio::main]
async fn main() {
    let env = std::env::var("SAPHARI_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Saphari Gateway v{}", env!("CARGO_PKG_VERSION"));

    // ── Database connection + migrations ─────────────────────────
    let db = DatabasePool::connect(&config.database).await?;
    saphari_database::migration::run_migrations(db.pool()).await?;

    let db_pool = db.pool().clone();
    let device_repo = Arc::new(DeviceRepository::new(db_pool.clone()));
    let presence_repo = Arc::new(PresenceRepository::new(db_pool.clone()));

    // ── Auth: token verification + access resolution ─────────────
    let jwt_verifier = Arc::new(JwtVerifier::new(&config.auth));
    let access_resolver: Arc<dyn AccessResolver> =
        Arc::new(CachedAccessResolver::new(device_repo.clone(), &config.auth));

    // ── Fan-out engine and presence tracker ──────────────────────
    let realtime = Arc::new(RealtimeEngine::new(config.realtime.clone()));
    let presence = Arc::new(PresenceTracker::new(
        presence_repo.clone(),
        access_resolver.clone(),
        realtime.clone(),
        config.broker.topic_prefix.clone(),
        config.presence.clone(),
    ));

    // ── Broker transport ─────────────────────────────────────────
    let bridge = Arc::new(MessageBridge::new(realtime.clone()));
    let dispatcher = InboundDispatcher::new(
        config.broker.topic_prefix.clone(),
        access_resolver.clone(),
        presence.clone(),
        bridge,
    );
    let (broker, broker_loop) = BrokerClient::new(&config.broker, dispatcher);

    // ── Background tasks ─────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let broker_task = tokio::spawn(broker_loop.run(shutdown_rx.clone()));
    let (sweep_task, flush_task) = spawn_presence_loops(
        presence.clone(),
        Duration::from_secs(config.presence.sweep_interval_seconds),
        Duration::from_secs(config.presence.flush_interval_seconds),
        shutdown_rx,
    );

    // ── HTTP server ──────────────────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        config: Arc::new(config),
        db_pool,
        device_repo,
        presence_repo,
        jwt_verifier,
        access_resolver,
        presence,
        realtime: realtime.clone(),
        broker,
    };
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Gateway listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Shutdown: stop timers, drop the broker connection without
    //    reconnecting, close fan-out connections ──────────────────
    tracing::info!("Shutting down");
    let _ = shutdown_tx.send(true);
    realtime.shutdown();
    let _ = tokio::join!(broker_task, sweep_task, flush_task);
    db.close().await;

    tracing::info!("Goodbye");
    Ok(())
}

/// Resolves when the process receives a termination signal.
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
