//! Top-level fan-out engine.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};
use uuid::Uuid;

use saphari_core::config::realtime::RealtimeConfig;
use saphari_core::traits::{BroadcastEvent, EventBroadcaster};

use crate::connection::handle::{ConnectionHandle, ConnectionId};
use crate::connection::rooms::RoomRegistry;

/// Coordinates rooms, registration, and multicast.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Room registry.
    rooms: Arc<RoomRegistry>,
    /// Engine configuration.
    config: RealtimeConfig,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("connections", &self.rooms.connection_count())
            .field("rooms", &self.rooms.room_count())
            .finish()
    }
}

impl RealtimeEngine {
    /// Creates a new engine.
    pub fn new(config: RealtimeConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            rooms: Arc::new(RoomRegistry::new()),
            config,
            shutdown_tx,
        }
    }

    /// The engine configuration.
    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// Registers an authenticated connection into its user's room.
    ///
    /// Returns the handle and the receiver the socket task drains for
    /// outbound messages.
    pub fn register(&self, user_id: Uuid) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size);
        let handle = Arc::new(ConnectionHandle::new(user_id, tx));
        self.rooms.join(handle.clone());

        info!(
            conn_id = %handle.id,
            user_id = %user_id,
            "WebSocket connection joined room"
        );

        (handle, rx)
    }

    /// Unregisters a connection, removing it from its room.
    pub fn unregister(&self, conn_id: &ConnectionId) {
        if let Some(handle) = self.rooms.leave(conn_id) {
            handle.mark_closed();
            info!(
                conn_id = %conn_id,
                user_id = %handle.user_id,
                "WebSocket connection left room"
            );
        }
    }

    /// Multicast an event to the rooms of the given users.
    ///
    /// Each open connection receives the event at most once per call,
    /// no matter how many of the target users it matches through.
    pub async fn broadcast(&self, user_ids: &HashSet<Uuid>, event: &BroadcastEvent) {
        let connections = self.rooms.connections_for_users(user_ids);
        if connections.is_empty() {
            return;
        }

        let msg = match serde_json::to_string(event) {
            Ok(m) => m,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize broadcast event");
                return;
            }
        };

        let mut delivered = 0usize;
        for connection in &connections {
            if connection.send(msg.clone()) {
                delivered += 1;
            }
        }

        debug!(
            topic = %event.topic,
            recipients = delivered,
            "Broadcast delivered"
        );
    }

    /// Returns a shutdown receiver for per-connection tasks.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Total number of open connections.
    pub fn connection_count(&self) -> usize {
        self.rooms.connection_count()
    }

    /// Number of non-empty rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.room_count()
    }

    /// Closes every connection and signals the socket tasks to exit.
    pub fn shutdown(&self) {
        info!("Shutting down real-time engine");
        let _ = self.shutdown_tx.send(());
        let closed = self.rooms.clear();
        for connection in &closed {
            connection.mark_closed();
        }
        info!(count = closed.len(), "All connections closed");
    }
}

#[async_trait]
impl EventBroadcaster for RealtimeEngine {
    async fn broadcast_to_users(&self, user_ids: &HashSet<Uuid>, event: &BroadcastEvent) {
        self.broadcast(user_ids, event).await;
    }
}
