//! Cache entry for resolved device access sets.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

/// One cached resolution result.
///
/// Entries are replace-on-write: the user set is shared read-only and a
/// refresh installs a whole new entry instead of mutating this one.
#[derive(Debug, Clone)]
pub struct AccessCacheEntry {
    /// The users authorized to observe the device. May be empty
    /// (negative caching for unknown or inaccessible devices).
    pub user_ids: Arc<HashSet<Uuid>>,
    /// When this entry stops being honored.
    pub expires_at: Instant,
}

impl AccessCacheEntry {
    /// Create an entry valid for `ttl` from now.
    pub fn new(user_ids: Arc<HashSet<Uuid>>, ttl: Duration) -> Self {
        Self {
            user_ids,
            expires_at: Instant::now() + ttl,
        }
    }

    /// Whether the entry is past its TTL.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}
