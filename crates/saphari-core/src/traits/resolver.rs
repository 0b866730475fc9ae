//! Access resolver trait — device id to authorized user set.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

/// Resolves which users may observe a device's traffic.
///
/// Implementations cache results and coalesce concurrent lookups; a lookup
/// that fails or finds no device yields an empty set rather than an error.
#[async_trait]
pub trait AccessResolver: Send + Sync + std::fmt::Debug + 'static {
    /// Resolve the set of users authorized to observe `device_id`.
    ///
    /// The returned set is shared and must not be mutated.
    async fn resolve(&self, device_id: &str) -> Arc<HashSet<Uuid>>;

    /// Forcibly evict any cached entry for `device_id`.
    ///
    /// Called when access grants change so the next resolution hits the
    /// directory again.
    fn invalidate(&self, device_id: &str);
}
