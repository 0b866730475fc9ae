//! Inbound message dispatch: authorization, presence, then the handler.

use std::sync::Arc;

use tracing::{debug, warn};

use saphari_core::traits::{AccessResolver, DeviceMessageHandler};
use saphari_presence::tracker::PresenceTracker;

use crate::topics::device_id_from_topic;

/// Routes one inbound broker message through the gateway pipeline.
///
/// Presence is tracked for every well-formed message, authorized or not,
/// so transitions for orphaned devices still reach the event log; the
/// message itself is only forwarded downstream when at least one user may
/// observe the device.
pub struct InboundDispatcher {
    /// Topic prefix device channels live under.
    topic_prefix: String,
    /// Access resolution (cached).
    resolver: Arc<dyn AccessResolver>,
    /// Presence tracker.
    presence: Arc<PresenceTracker>,
    /// Downstream handler for authorized messages.
    handler: Arc<dyn DeviceMessageHandler>,
}

impl std::fmt::Debug for InboundDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundDispatcher")
            .field("topic_prefix", &self.topic_prefix)
            .finish()
    }
}

impl InboundDispatcher {
    /// Creates a new dispatcher.
    pub fn new(
        topic_prefix: impl Into<String>,
        resolver: Arc<dyn AccessResolver>,
        presence: Arc<PresenceTracker>,
        handler: Arc<dyn DeviceMessageHandler>,
    ) -> Self {
        Self {
            topic_prefix: topic_prefix.into(),
            resolver,
            presence,
            handler,
        }
    }

    /// Dispatch one raw message. Malformed topics are silently dropped;
    /// handler failures are logged and never crash the transport loop.
    pub async fn dispatch(&self, topic: &str, payload: &[u8]) {
        let Some(device_id) = device_id_from_topic(&self.topic_prefix, topic) else {
            debug!(topic = %topic, "Dropping message with malformed topic");
            return;
        };
        let device_id = device_id.to_string();
        let payload = String::from_utf8_lossy(payload).into_owned();

        let authorized = self.resolver.resolve(&device_id).await;

        self.presence.observe(&device_id, topic, &payload);

        if authorized.is_empty() {
            debug!(device_id = %device_id, "No authorized users, dropping message");
            return;
        }

        if let Err(e) = self
            .handler
            .handle(&device_id, topic, &payload, authorized)
            .await
        {
            warn!(device_id = %device_id, error = %e, "Message handler failed");
        }
    }
}
