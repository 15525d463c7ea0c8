//! Cache Store Module
//!
//! In-memory [`ListCache`] partitioned by tenant. Each partition has its own
//! lock and LRU tracker, so tenants never contend on lookups.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::{
    CacheCounters, CacheEntry, CacheResult, CacheStats, CachedPage, Fingerprint, ListCache,
    LruTracker,
};

// == Tenant Cache ==
/// Pages cached for one tenant, keyed by fingerprint digest.
#[derive(Debug, Default)]
struct TenantCache {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
}

impl TenantCache {
    fn remove(&mut self, digest: &str) {
        self.entries.remove(digest);
        self.lru.remove(digest);
    }

    /// Drops expired entries, returning how many went.
    fn purge_expired(&mut self, ttl: Duration) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(ttl))
            .map(|(digest, _)| digest.clone())
            .collect();

        for digest in &expired {
            self.remove(digest);
        }
        expired.len()
    }
}

// == Memory List Cache ==
/// Thread-safe in-memory page cache with TTL and per-tenant LRU bound.
#[derive(Debug)]
pub struct MemoryListCache {
    partitions: RwLock<HashMap<String, Arc<Mutex<TenantCache>>>>,
    counters: CacheCounters,
    /// Freshness window of every entry
    ttl: Duration,
    /// Maximum pages held per tenant
    max_entries_per_tenant: usize,
}

impl MemoryListCache {
    // == Constructor ==
    /// Creates a cache whose entries live for `ttl`, holding at most
    /// `max_entries_per_tenant` pages for any one tenant.
    pub fn new(ttl: Duration, max_entries_per_tenant: usize) -> Self {
        Self {
            partitions: RwLock::new(HashMap::new()),
            counters: CacheCounters::new(),
            ttl,
            max_entries_per_tenant,
        }
    }

    async fn partition(&self, tenant_id: &str) -> Option<Arc<Mutex<TenantCache>>> {
        self.partitions.read().await.get(tenant_id).cloned()
    }

    async fn partition_or_create(&self, tenant_id: &str) -> Arc<Mutex<TenantCache>> {
        if let Some(partition) = self.partition(tenant_id).await {
            return partition;
        }
        let mut partitions = self.partitions.write().await;
        partitions.entry(tenant_id.to_string()).or_default().clone()
    }

    async fn all_partitions(&self) -> Vec<Arc<Mutex<TenantCache>>> {
        self.partitions.read().await.values().cloned().collect()
    }

    /// Drops partitions that hold no pages and that no caller is using.
    ///
    /// A partition referenced only by the map cannot be locked by anyone
    /// else while the map's write guard is held, so `try_lock` succeeds.
    async fn prune_empty_partitions(&self) -> usize {
        let mut partitions = self.partitions.write().await;
        let before = partitions.len();
        partitions.retain(|_, partition| {
            Arc::strong_count(partition) > 1
                || partition
                    .try_lock()
                    .map(|tenant| !tenant.entries.is_empty())
                    .unwrap_or(true)
        });
        before - partitions.len()
    }

    /// Number of tenant partitions currently allocated.
    #[cfg(test)]
    pub async fn partition_count(&self) -> usize {
        self.partitions.read().await.len()
    }

    // == Length ==
    /// Number of pages held, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        let mut total = 0;
        for partition in self.all_partitions().await {
            total += partition.lock().await.entries.len();
        }
        total
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of pages held for one tenant.
    pub async fn tenant_len(&self, tenant_id: &str) -> usize {
        match self.partition(tenant_id).await {
            Some(partition) => partition.lock().await.entries.len(),
            None => 0,
        }
    }
}

#[async_trait]
impl ListCache for MemoryListCache {
    // == Get ==
    /// Expired entries are removed on sight and counted as misses.
    async fn get(&self, fingerprint: &Fingerprint) -> CacheResult<Option<CachedPage>> {
        let Some(partition) = self.partition(fingerprint.tenant_id()).await else {
            self.counters.record_miss();
            return Ok(None);
        };
        let mut tenant = partition.lock().await;
        let digest = fingerprint.digest();

        let expired = match tenant.entries.get(digest) {
            None => {
                self.counters.record_miss();
                return Ok(None);
            }
            Some(entry) => entry.is_expired(self.ttl),
        };

        if expired {
            tenant.remove(digest);
            self.counters.record_expirations(1);
            self.counters.record_miss();
            debug!(%fingerprint, "cached page expired");
            return Ok(None);
        }

        tenant.lru.touch(digest);
        self.counters.record_hit();
        Ok(tenant.entries.get(digest).map(|entry| entry.page.clone()))
    }

    // == Put ==
    async fn put(&self, fingerprint: Fingerprint, page: CachedPage) -> CacheResult<()> {
        if self.max_entries_per_tenant == 0 || self.ttl.is_zero() {
            return Ok(());
        }

        let partition = self.partition_or_create(fingerprint.tenant_id()).await;
        let mut tenant = partition.lock().await;
        let digest = fingerprint.digest().to_string();

        if !tenant.entries.contains_key(&digest) {
            // Reclaim expired slots before evicting live ones.
            if tenant.entries.len() >= self.max_entries_per_tenant {
                let purged = tenant.purge_expired(self.ttl);
                self.counters.record_expirations(purged);
            }
            while tenant.entries.len() >= self.max_entries_per_tenant {
                match tenant.lru.evict_oldest() {
                    Some(evicted) => {
                        tenant.entries.remove(&evicted);
                        self.counters.record_eviction();
                    }
                    None => break,
                }
            }
        }

        tenant.entries.insert(digest.clone(), CacheEntry::new(page));
        tenant.lru.touch(&digest);
        Ok(())
    }

    // == Invalidate Tenant ==
    async fn invalidate_tenant(&self, tenant_id: &str) -> CacheResult<usize> {
        let Some(partition) = self.partition(tenant_id).await else {
            return Ok(0);
        };
        let mut tenant = partition.lock().await;

        let removed = tenant.entries.len();
        tenant.entries.clear();
        tenant.lru.clear();
        self.counters.record_invalidated(removed);
        Ok(removed)
    }

    // == Sweep Expired ==
    async fn sweep_expired(&self) -> CacheResult<usize> {
        let mut removed = 0;
        for partition in self.all_partitions().await {
            removed += partition.lock().await.purge_expired(self.ttl);
        }
        self.counters.record_expirations(removed);

        let dropped = self.prune_empty_partitions().await;
        if dropped > 0 {
            debug!(dropped, "empty tenant partitions dropped");
        }
        Ok(removed)
    }

    // == Stats ==
    async fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.len().await)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn fp(tenant: &str, limit: usize) -> Fingerprint {
        Fingerprint::new(tenant, None, None, None, limit)
    }

    fn page_for(fingerprint: &Fingerprint) -> CachedPage {
        CachedPage {
            fingerprint: fingerprint.digest().to_string(),
            items: Vec::new(),
            next_cursor: Some(format!("next-{}", fingerprint.digest())),
        }
    }

    async fn put(cache: &MemoryListCache, fingerprint: &Fingerprint) {
        cache
            .put(fingerprint.clone(), page_for(fingerprint))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_missing() {
        let cache = MemoryListCache::new(Duration::from_secs(30), 10);
        assert!(cache.get(&fp("t1", 10)).await.unwrap().is_none());
        assert_eq!(cache.stats().await.misses, 1);
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let cache = MemoryListCache::new(Duration::from_secs(30), 10);
        let key = fp("t1", 10);
        put(&cache, &key).await;

        let page = cache.get(&key).await.unwrap().unwrap();
        assert_eq!(page, page_for(&key));

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[tokio::test]
    async fn test_ttl_expiration_is_lazy() {
        let cache = MemoryListCache::new(Duration::from_millis(50), 10);
        let key = fp("t1", 10);
        put(&cache, &key).await;

        sleep(Duration::from_millis(80)).await;

        // Still physically present until looked up.
        assert_eq!(cache.len().await, 1);
        assert!(cache.get(&key).await.unwrap().is_none());
        assert_eq!(cache.len().await, 0);

        let stats = cache.stats().await;
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_invalidate_tenant_drops_all_its_pages() {
        let cache = MemoryListCache::new(Duration::from_secs(30), 10);
        for limit in 1..=3 {
            put(&cache, &fp("t1", limit)).await;
        }
        put(&cache, &fp("t2", 1)).await;

        assert_eq!(cache.invalidate_tenant("t1").await.unwrap(), 3);

        for limit in 1..=3 {
            assert!(cache.get(&fp("t1", limit)).await.unwrap().is_none());
        }
        assert!(cache.get(&fp("t2", 1)).await.unwrap().is_some());
        assert_eq!(cache.stats().await.invalidated, 3);
    }

    #[tokio::test]
    async fn test_invalidate_unknown_tenant() {
        let cache = MemoryListCache::new(Duration::from_secs(30), 10);
        assert_eq!(cache.invalidate_tenant("nobody").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_lru_bound_per_tenant() {
        let cache = MemoryListCache::new(Duration::from_secs(30), 2);
        put(&cache, &fp("t1", 1)).await;
        put(&cache, &fp("t1", 2)).await;
        // Touch 1 so 2 becomes the eviction candidate.
        cache.get(&fp("t1", 1)).await.unwrap();
        put(&cache, &fp("t1", 3)).await;
        put(&cache, &fp("t2", 1)).await;

        assert_eq!(cache.tenant_len("t1").await, 2);
        assert_eq!(cache.tenant_len("t2").await, 1);
        assert!(cache.get(&fp("t1", 1)).await.unwrap().is_some());
        assert!(cache.get(&fp("t1", 2)).await.unwrap().is_none());
        assert!(cache.get(&fp("t1", 3)).await.unwrap().is_some());
        assert_eq!(cache.stats().await.evictions, 1);
    }

    #[tokio::test]
    async fn test_overwrite_same_fingerprint() {
        let cache = MemoryListCache::new(Duration::from_secs(30), 1);
        let key = fp("t1", 1);
        put(&cache, &key).await;

        let mut replacement = page_for(&key);
        replacement.next_cursor = None;
        cache.put(key.clone(), replacement.clone()).await.unwrap();

        assert_eq!(cache.get(&key).await.unwrap(), Some(replacement));
        assert_eq!(cache.stats().await.evictions, 0);
    }

    #[tokio::test]
    async fn test_sweep_expired() {
        let cache = MemoryListCache::new(Duration::from_millis(50), 10);
        put(&cache, &fp("t1", 1)).await;
        put(&cache, &fp("t2", 1)).await;

        sleep(Duration::from_millis(80)).await;
        put(&cache, &fp("t1", 2)).await;

        assert_eq!(cache.sweep_expired().await.unwrap(), 2);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.partition_count().await, 1);
    }

    #[tokio::test]
    async fn test_sweep_drops_empty_partitions() {
        let cache = MemoryListCache::new(Duration::from_millis(1), 10);
        for i in 0..1000 {
            put(&cache, &fp(&format!("ghost-{}", i), 20)).await;
        }
        assert_eq!(cache.partition_count().await, 1000);

        sleep(Duration::from_millis(10)).await;
        assert_eq!(cache.sweep_expired().await.unwrap(), 1000);
        assert_eq!(cache.partition_count().await, 0);

        // A dropped tenant starts a fresh partition on its next fill.
        put(&cache, &fp("ghost-1", 20)).await;
        assert_eq!(cache.partition_count().await, 1);
        assert_eq!(cache.tenant_len("ghost-1").await, 1);
    }

    #[tokio::test]
    async fn test_sweep_keeps_invalidated_partition_in_use() {
        let cache = MemoryListCache::new(Duration::from_secs(30), 10);
        put(&cache, &fp("t1", 1)).await;
        cache.invalidate_tenant("t1").await.unwrap();

        let held = cache.partition("t1").await;
        assert_eq!(cache.sweep_expired().await.unwrap(), 0);
        assert_eq!(cache.partition_count().await, 1);

        drop(held);
        cache.sweep_expired().await.unwrap();
        assert_eq!(cache.partition_count().await, 0);
    }

    #[tokio::test]
    async fn test_zero_capacity_or_ttl_disables_caching() {
        let no_room = MemoryListCache::new(Duration::from_secs(30), 0);
        put(&no_room, &fp("t1", 1)).await;
        assert!(no_room.is_empty().await);

        let no_ttl = MemoryListCache::new(Duration::ZERO, 10);
        put(&no_ttl, &fp("t1", 1)).await;
        assert!(no_ttl.get(&fp("t1", 1)).await.unwrap().is_none());
    }
}
