//! Bridge from authorized broker messages to room multicasts.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use saphari_core::result::AppResult;
use saphari_core::traits::{BroadcastEvent, DeviceMessageHandler, EventBroadcaster};
use saphari_presence::normalize::normalize_topic_payload;

/// Normalizes each authorized device message and multicasts it to the
/// rooms of the authorized users.
pub struct MessageBridge {
    /// Fan-out sink.
    broadcaster: Arc<dyn EventBroadcaster>,
}

impl std::fmt::Debug for MessageBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBridge").finish()
    }
}

impl MessageBridge {
    /// Creates a new bridge over a broadcaster.
    pub fn new(broadcaster: Arc<dyn EventBroadcaster>) -> Self {
        Self { broadcaster }
    }
}

#[async_trait]
impl DeviceMessageHandler for MessageBridge {
    async fn handle(
        &self,
        _device_id: &str,
        topic: &str,
        payload: &str,
        authorized: Arc<HashSet<Uuid>>,
    ) -> AppResult<()> {
        let (topic, payload) = normalize_topic_payload(topic, payload);
        let event = BroadcastEvent {
            topic,
            payload,
            ts: Utc::now().timestamp_millis(),
        };
        self.broadcaster.broadcast_to_users(&authorized, &event).await;
        Ok(())
    }
}
