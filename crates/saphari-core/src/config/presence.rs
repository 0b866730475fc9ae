//! Device presence tracking configuration.

use serde::{Deserialize, Serialize};

/// Presence tracker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Seconds of silence after which an online device is demoted to offline.
    #[serde(default = "default_offline_ttl")]
    pub offline_ttl_seconds: u64,
    /// Interval between TTL sweeps, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// Interval between persistence flushes, in seconds.
    #[serde(default = "default_flush_interval")]
    pub flush_interval_seconds: u64,
    /// Minimum age of the last persisted snapshot before a device is
    /// flushed again, in seconds. Bounds write volume under high message
    /// rates.
    #[serde(default = "default_min_flush_age")]
    pub min_flush_age_seconds: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            offline_ttl_seconds: default_offline_ttl(),
            sweep_interval_seconds: default_sweep_interval(),
            flush_interval_seconds: default_flush_interval(),
            min_flush_age_seconds: default_min_flush_age(),
        }
    }
}

fn default_offline_ttl() -> u64 {
    45
}

fn default_sweep_interval() -> u64 {
    10
}

fn default_flush_interval() -> u64 {
    10
}

fn default_min_flush_age() -> u64 {
    10
}
