//! Authentication and access-resolution configuration.

use serde::{Deserialize, Serialize};

/// Authentication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to verify JWT access tokens.
    pub jwt_secret: String,
    /// TTL for device access cache entries, in seconds.
    #[serde(default = "default_access_cache_ttl")]
    pub access_cache_ttl_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_cache_ttl_seconds: default_access_cache_ttl(),
        }
    }
}

fn default_access_cache_ttl() -> u64 {
    45
}
