//! Cached device-access resolver with single-flight de-duplication.
//!
//! Two broker messages for the same uncached device can arrive in
//! back-to-back event-loop turns; without coalescing, each would start its
//! own directory lookup. The in-flight map guarantees at most one
//! outstanding upstream query per device id, with every concurrent caller
//! awaiting the same shared future.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{debug, warn};
use uuid::Uuid;

use saphari_core::config::auth::AuthConfig;
use saphari_core::traits::{AccessResolver, DeviceDirectory};

use super::cache::AccessCacheEntry;

type SharedResolution = Shared<BoxFuture<'static, Arc<HashSet<Uuid>>>>;

/// Resolves device access through the directory, caching results for a
/// fixed TTL and coalescing concurrent lookups per device.
#[derive(Clone)]
pub struct CachedAccessResolver {
    /// The directory backing resolution.
    directory: Arc<dyn DeviceDirectory>,
    /// Device id → cached access set.
    cache: Arc<DashMap<String, AccessCacheEntry>>,
    /// Device id → in-flight resolution shared by all waiting callers.
    in_flight: Arc<DashMap<String, SharedResolution>>,
    /// Entry lifetime.
    ttl: Duration,
}

impl std::fmt::Debug for CachedAccessResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedAccessResolver")
            .field("cached_entries", &self.cache.len())
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

impl CachedAccessResolver {
    /// Creates a resolver from auth configuration.
    pub fn new(directory: Arc<dyn DeviceDirectory>, config: &AuthConfig) -> Self {
        Self::with_ttl(
            directory,
            Duration::from_secs(config.access_cache_ttl_seconds),
        )
    }

    /// Creates a resolver with an explicit TTL.
    pub fn with_ttl(directory: Arc<dyn DeviceDirectory>, ttl: Duration) -> Self {
        Self {
            directory,
            cache: Arc::new(DashMap::new()),
            in_flight: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Number of currently cached entries (expired ones included until
    /// they are replaced).
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Builds the shared future that performs one directory lookup and
    /// installs the result in the cache.
    ///
    /// Lookup failure and device-not-found both resolve to an empty set
    /// cached for the full TTL, so unknown or deleted devices cannot
    /// hammer the directory with repeated failed lookups.
    fn start_resolution(&self, device_id: &str) -> BoxFuture<'static, Arc<HashSet<Uuid>>> {
        let directory = self.directory.clone();
        let cache = self.cache.clone();
        let in_flight = self.in_flight.clone();
        let ttl = self.ttl;
        let device_id = device_id.to_string();

        async move {
            let user_ids: HashSet<Uuid> =
                match directory.owner_and_granted_users(&device_id).await {
                    Ok(Some(access)) => access.user_ids().collect(),
                    Ok(None) => {
                        debug!(device_id = %device_id, "Device not in directory, caching empty access set");
                        HashSet::new()
                    }
                    Err(e) => {
                        warn!(device_id = %device_id, error = %e, "Directory lookup failed, treating as no access");
                        HashSet::new()
                    }
                };

            let user_ids = Arc::new(user_ids);
            cache.insert(
                device_id.clone(),
                AccessCacheEntry::new(user_ids.clone(), ttl),
            );
            in_flight.remove(&device_id);
            user_ids
        }
        .boxed()
    }
}

#[async_trait]
impl AccessResolver for CachedAccessResolver {
    async fn resolve(&self, device_id: &str) -> Arc<HashSet<Uuid>> {
        if let Some(entry) = self.cache.get(device_id) {
            if !entry.is_expired() {
                return entry.user_ids.clone();
            }
        }

        // Join an existing resolution or start a new one. The entry guard
        // is released before awaiting.
        let resolution = match self.in_flight.entry(device_id.to_string()) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(slot) => {
                let fut = self.start_resolution(device_id).shared();
                slot.insert(fut.clone());
                fut
            }
        };

        resolution.await
    }

    fn invalidate(&self, device_id: &str) {
        if self.cache.remove(device_id).is_some() {
            debug!(device_id = %device_id, "Evicted access cache entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::future::join_all;
    use saphari_core::error::AppError;
    use saphari_core::result::AppResult;
    use saphari_core::traits::DeviceAccess;

    /// Directory fake that counts lookups and optionally delays or fails.
    #[derive(Debug)]
    struct FakeDirectory {
        calls: AtomicUsize,
        access: Option<DeviceAccess>,
        fail: bool,
        delay: Duration,
    }

    impl FakeDirectory {
        fn returning(access: Option<DeviceAccess>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                access,
                fail: false,
                delay: Duration::ZERO,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DeviceDirectory for FakeDirectory {
        async fn owner_and_granted_users(
            &self,
            _device_id: &str,
        ) -> AppResult<Option<DeviceAccess>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(AppError::database("directory unavailable"));
            }
            Ok(self.access.clone())
        }
    }

    fn access_for(owner: Uuid, granted: &[Uuid]) -> DeviceAccess {
        DeviceAccess {
            owner_id: owner,
            granted_user_ids: granted.to_vec(),
        }
    }

    fn resolver_over(directory: Arc<FakeDirectory>) -> CachedAccessResolver {
        CachedAccessResolver::with_ttl(directory, Duration::from_secs(45))
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_resolves_share_one_lookup() {
        let owner = Uuid::new_v4();
        let directory = Arc::new(FakeDirectory {
            delay: Duration::from_millis(50),
            ..FakeDirectory::returning(Some(access_for(owner, &[])))
        });
        let resolver = resolver_over(directory.clone());

        let results = join_all((0..8).map(|_| resolver.resolve("pump-1"))).await;

        assert_eq!(directory.call_count(), 1);
        for set in results {
            assert_eq!(set.len(), 1);
            assert!(set.contains(&owner));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_honored_within_ttl() {
        let owner = Uuid::new_v4();
        let granted = Uuid::new_v4();
        let directory = Arc::new(FakeDirectory::returning(Some(access_for(
            owner,
            &[granted],
        ))));
        let resolver = resolver_over(directory.clone());

        let first = resolver.resolve("pump-1").await;
        assert_eq!(first.len(), 2);

        tokio::time::advance(Duration::from_secs(44)).await;
        let second = resolver.resolve("pump-1").await;
        assert_eq!(directory.call_count(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_expires_after_ttl() {
        let directory = Arc::new(FakeDirectory::returning(Some(access_for(
            Uuid::new_v4(),
            &[],
        ))));
        let resolver = resolver_over(directory.clone());

        resolver.resolve("pump-1").await;
        tokio::time::advance(Duration::from_millis(45_001)).await;
        resolver.resolve("pump-1").await;

        assert_eq!(directory.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_device_negatively_cached() {
        let directory = Arc::new(FakeDirectory::returning(None));
        let resolver = resolver_over(directory.clone());

        let first = resolver.resolve("ghost-7").await;
        assert!(first.is_empty());

        let second = resolver.resolve("ghost-7").await;
        assert!(second.is_empty());
        assert_eq!(directory.call_count(), 1, "empty result must be cached");
    }

    #[tokio::test(start_paused = true)]
    async fn test_directory_error_degrades_to_empty_set() {
        let directory = Arc::new(FakeDirectory {
            fail: true,
            ..FakeDirectory::returning(None)
        });
        let resolver = resolver_over(directory.clone());

        let result = resolver.resolve("pump-1").await;
        assert!(result.is_empty());

        resolver.resolve("pump-1").await;
        assert_eq!(directory.call_count(), 1, "failures are negatively cached");
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_fresh_lookup() {
        let directory = Arc::new(FakeDirectory::returning(Some(access_for(
            Uuid::new_v4(),
            &[],
        ))));
        let resolver = resolver_over(directory.clone());

        resolver.resolve("pump-1").await;
        resolver.invalidate("pump-1");
        resolver.resolve("pump-1").await;

        assert_eq!(directory.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_devices_resolve_independently() {
        let directory = Arc::new(FakeDirectory::returning(Some(access_for(
            Uuid::new_v4(),
            &[],
        ))));
        let resolver = resolver_over(directory.clone());

        resolver.resolve("pump-1").await;
        resolver.resolve("valve-2").await;

        assert_eq!(directory.call_count(), 2);
        assert_eq!(resolver.cached_entries(), 2);
    }
}
