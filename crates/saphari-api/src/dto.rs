//! Request and response DTOs.

use serde::{Deserialize, Serialize};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Basic health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Detailed health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// Service status.
    pub status: String,
    /// Database reachability.
    pub database: String,
    /// Whether the broker connection is established.
    pub broker_connected: bool,
    /// Open WebSocket connections.
    pub ws_connections: usize,
    /// Non-empty rooms.
    pub rooms: usize,
    /// Devices seen since startup.
    pub tracked_devices: usize,
}

/// Device command request body.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandRequest {
    /// Command name (last segment of the command topic).
    pub command: String,
    /// Command payload forwarded to the device as JSON.
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Device command acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// Target device.
    pub device_id: String,
    /// Topic the command was published to.
    pub topic: String,
}
