//! Presence store trait — durable side of the presence tracker.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::result::AppResult;

/// Persistence operations for device presence.
///
/// Both operations are best-effort from the tracker's point of view:
/// failures are logged by the caller and never block message delivery.
#[async_trait]
pub trait PresenceStore: Send + Sync + 'static {
    /// Append an immutable presence transition record.
    async fn append_presence_event(
        &self,
        device_id: &str,
        online: bool,
        occurred_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Upsert the device's presence snapshot (`last_seen` + `online`).
    async fn upsert_device_presence(
        &self,
        device_id: &str,
        online: bool,
        last_seen: DateTime<Utc>,
    ) -> AppResult<()>;
}
