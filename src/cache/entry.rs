//! Cache Entry Module
//!
//! Defines the cached page payload and the TTL-bearing entry that wraps it.

use std::time::{Duration, Instant};

use crate::models::Checkout;

// == Cached Page ==
/// A previously computed listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPage {
    /// Digest of the fingerprint the page was computed for
    pub fingerprint: String,
    pub items: Vec<Checkout>,
    pub next_cursor: Option<String>,
}

// == Cache Entry ==
/// A cached page together with the instant it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub page: CachedPage,
    pub stored_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    pub fn new(page: CachedPage) -> Self {
        Self {
            page,
            stored_at: Instant::now(),
        }
    }

    // == Is Expired ==
    /// Checks whether the entry is older than `ttl`.
    ///
    /// An entry is valid only while `now - stored_at < ttl`, so it expires
    /// the moment its age reaches the TTL. A zero TTL disables caching.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() >= ttl
    }
}
