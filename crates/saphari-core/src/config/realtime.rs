//! Real-time WebSocket engine configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Milliseconds a connection may stay unauthenticated before it is closed.
    #[serde(default = "default_auth_timeout")]
    pub auth_timeout_ms: u64,
    /// Maximum accepted client message size in bytes.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
    /// Internal per-connection outbound buffer size.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            auth_timeout_ms: default_auth_timeout(),
            max_message_bytes: default_max_message_bytes(),
            channel_buffer_size: default_channel_buffer(),
        }
    }
}

fn default_auth_timeout() -> u64 {
    5_000
}

fn default_max_message_bytes() -> usize {
    8_192
}

fn default_channel_buffer() -> usize {
    256
}
