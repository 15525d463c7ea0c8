//! Per-tenant read/write guards
//!
//! Writers hold a tenant's write guard across "mutate store, invalidate
//! cache"; readers hold the read guard across "cache lookup, scan, cache
//! fill". A reader can therefore never observe or cache a page computed
//! from data that a finished write has already changed.
//!
//! When a writer fails to invalidate, the tenant is marked stale and
//! readers bypass the cache until an invalidation goes through.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

// == Tenant Locks ==
#[derive(Debug, Default)]
pub struct TenantLocks {
    locks: Mutex<HashMap<String, Arc<RwLock<()>>>>,
    stale: Mutex<HashSet<String>>,
}

impl TenantLocks {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lock_for(&self, tenant_id: &str) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(tenant_id.to_string()).or_default().clone()
    }

    /// Shared guard for a listing read. Readers of one tenant run in parallel.
    pub async fn read(&self, tenant_id: &str) -> OwnedRwLockReadGuard<()> {
        self.lock_for(tenant_id).await.read_owned().await
    }

    /// Exclusive guard for a mutation of one tenant's records.
    pub async fn write(&self, tenant_id: &str) -> OwnedRwLockWriteGuard<()> {
        self.lock_for(tenant_id).await.write_owned().await
    }

    // == Stale Tenants ==
    /// Records that the tenant's cached pages may predate its last write.
    pub async fn mark_stale(&self, tenant_id: &str) {
        self.stale.lock().await.insert(tenant_id.to_string());
    }

    pub async fn clear_stale(&self, tenant_id: &str) {
        self.stale.lock().await.remove(tenant_id);
    }

    pub async fn is_stale(&self, tenant_id: &str) -> bool {
        self.stale.lock().await.contains(tenant_id)
    }

    // == Prune ==
    /// Drops locks that no guard or waiter holds, returning how many went.
    ///
    /// Every outstanding guard owns a clone of its lock, so a strong count
    /// of one means only this map refers to it.
    pub async fn prune_idle(&self) -> usize {
        let mut locks = self.locks.lock().await;
        let before = locks.len();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - locks.len()
    }

    /// Number of tenants with a live lock entry.
    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_readers_share_a_tenant() {
        let locks = TenantLocks::new();
        let _a = locks.read("t1").await;
        let b = timeout(Duration::from_millis(100), locks.read("t1")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_writer_excludes_readers_of_same_tenant() {
        let locks = TenantLocks::new();
        let _w = locks.write("t1").await;
        let r = timeout(Duration::from_millis(50), locks.read("t1")).await;
        assert!(r.is_err());
    }

    #[tokio::test]
    async fn test_tenants_do_not_contend() {
        let locks = TenantLocks::new();
        let _w = locks.write("t1").await;
        let other = timeout(Duration::from_millis(100), locks.write("t2")).await;
        assert!(other.is_ok());
        assert_eq!(locks.len().await, 2);
    }

    #[tokio::test]
    async fn test_dropping_guard_releases() {
        let locks = TenantLocks::new();
        drop(locks.write("t1").await);
        let again = timeout(Duration::from_millis(100), locks.write("t1")).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_prune_drops_only_idle_locks() {
        let locks = TenantLocks::new();
        for i in 0..50 {
            drop(locks.read(&format!("ghost-{}", i)).await);
        }
        let held = locks.write("busy").await;
        assert_eq!(locks.len().await, 51);

        assert_eq!(locks.prune_idle().await, 50);
        assert_eq!(locks.len().await, 1);

        // The held guard still excludes a new writer after pruning.
        let blocked = timeout(Duration::from_millis(50), locks.write("busy")).await;
        assert!(blocked.is_err());

        drop(held);
        assert_eq!(locks.prune_idle().await, 1);
        assert_eq!(locks.len().await, 0);
    }

    #[tokio::test]
    async fn test_stale_flag_roundtrip() {
        let locks = TenantLocks::new();
        assert!(!locks.is_stale("t1").await);

        locks.mark_stale("t1").await;
        assert!(locks.is_stale("t1").await);
        assert!(!locks.is_stale("t2").await);

        locks.clear_stale("t1").await;
        assert!(!locks.is_stale("t1").await);
    }
}
