//! Device entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered IoT device.
///
/// The presence snapshot (`online` + `last_seen`) lives on the device row
/// and is refreshed by the periodic flush; `presence_events` holds the
/// immutable transition log.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Device {
    /// Device identifier as it appears on the wire (second topic segment).
    pub id: String,
    /// The owning user.
    pub owner_id: Uuid,
    /// Human-readable device name.
    pub name: Option<String>,
    /// Whether the device is currently considered online.
    pub online: bool,
    /// Last time any traffic was seen from the device.
    pub last_seen: Option<DateTime<Utc>>,
    /// When the device was registered.
    pub created_at: DateTime<Utc>,
}
