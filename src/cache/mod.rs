//! Cache Module
//!
//! Short-lived read cache for listing pages with lazy TTL expiration,
//! per-tenant LRU bounds and tenant-wide invalidation.

mod entry;
mod fingerprint;
mod lru;
mod stats;
mod store;


use async_trait::async_trait;

use crate::error::CacheError;

// Re-export public types
pub use entry::{CacheEntry, CachedPage};
pub use fingerprint::Fingerprint;
pub use lru::LruTracker;
pub use stats::{CacheCounters, CacheStats};
pub use store::MemoryListCache;

/// Result type for cache backends.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

// == List Cache Trait ==
/// Page cache consulted by the listing service.
///
/// The cache has no correctness authority: callers treat any error as a
/// miss. Implementations must never return an entry older than their TTL.
#[async_trait]
pub trait ListCache: Send + Sync {
    /// Returns the live page stored under `fingerprint`, if any.
    async fn get(&self, fingerprint: &Fingerprint) -> CacheResult<Option<CachedPage>>;

    /// Stores a page, replacing any previous one under the same fingerprint.
    async fn put(&self, fingerprint: Fingerprint, page: CachedPage) -> CacheResult<()>;

    /// Drops every page cached for `tenant_id`. Returns how many were dropped.
    async fn invalidate_tenant(&self, tenant_id: &str) -> CacheResult<usize>;

    /// Physically removes expired pages. Returns how many were removed.
    async fn sweep_expired(&self) -> CacheResult<usize>;

    /// Current statistics.
    async fn stats(&self) -> CacheStats;
}
