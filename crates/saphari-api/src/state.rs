//! Application state shared across all handlers.

use std::sync::Arc;

use sqlx::PgPool;

use saphari_auth::jwt::verifier::JwtVerifier;
use saphari_broker::client::BrokerClient;
use saphari_core::config::AppConfig;
use saphari_core::traits::AccessResolver;
use saphari_database::repositories::device::DeviceRepository;
use saphari_database::repositories::presence::PresenceRepository;
use saphari_presence::tracker::PresenceTracker;
use saphari_realtime::engine::RealtimeEngine;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped (or cheap clones) for sharing across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// PostgreSQL connection pool
    pub db_pool: PgPool,
    /// Device repository (directory)
    pub device_repo: Arc<DeviceRepository>,
    /// Presence repository (event log + snapshots)
    pub presence_repo: Arc<PresenceRepository>,
    /// JWT access token verifier
    pub jwt_verifier: Arc<JwtVerifier>,
    /// Cached device access resolver
    pub access_resolver: Arc<dyn AccessResolver>,
    /// Device presence tracker
    pub presence: Arc<PresenceTracker>,
    /// WebSocket fan-out engine
    pub realtime: Arc<RealtimeEngine>,
    /// Broker publish handle
    pub broker: BrokerClient,
}
