//! Event broadcaster trait and the normalized wire event.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The normalized event delivered to browser clients.
///
/// Downstream consumers rely on this shape being stable regardless of the
/// device's raw wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastEvent {
    /// Normalized topic.
    pub topic: String,
    /// Normalized payload.
    pub payload: String,
    /// Epoch milliseconds at which the gateway produced the event.
    pub ts: i64,
}

/// Multicasts events to the connections of a set of users.
#[async_trait]
pub trait EventBroadcaster: Send + Sync + 'static {
    /// Deliver `event` exactly once to every open, authenticated connection
    /// belonging to any of `user_ids`.
    async fn broadcast_to_users(&self, user_ids: &HashSet<Uuid>, event: &BroadcastEvent);
}
