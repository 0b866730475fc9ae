//! Presence event entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One immutable presence transition record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PresenceEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// The device that transitioned.
    pub device_id: String,
    /// The state the device transitioned into.
    pub online: bool,
    /// When the transition was observed.
    pub occurred_at: DateTime<Utc>,
}
