//! Listing Service
//!
//! Orchestrates the record store, the cursor codec and the list cache.
//! Every mutation invalidates the tenant's cached pages before its write
//! guard is released, and every read holds the tenant's read guard from
//! cache lookup until the freshly computed page is cached.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::TenantLocks;
use crate::cache::{
    CacheResult, CacheStats, CachedPage, Fingerprint, ListCache, MemoryListCache,
};
use crate::config::Config;
use crate::cursor;
use crate::error::{CheckoutError, Result};
use crate::models::{normalize_currency, now_micros, Checkout, CheckoutStatus, NewCheckout};
use crate::store::{CheckoutStore, MemoryStore, ScanQuery};

// == Public Constants ==
/// Page size used when the caller gives none
pub const DEFAULT_LIMIT: usize = 20;

/// Largest page size; bigger requests are clamped to it
pub const MAX_LIMIT: usize = 100;

/// Maximum length of tenant and checkout identifiers, in bytes
pub const MAX_ID_LENGTH: usize = 256;

// == List Query ==
/// Parameters of a listing call.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub tenant_id: String,
    /// Opaque token from a previous page; empty or absent for the first page
    pub cursor: Option<String>,
    pub status: Option<CheckoutStatus>,
    pub currency: Option<String>,
    /// Absent means [`DEFAULT_LIMIT`]; zero or negative is rejected
    pub limit: Option<i64>,
}

impl ListQuery {
    /// First page of a tenant with default parameters.
    pub fn first_page(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn with_status(mut self, status: CheckoutStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }
}

// == Checkout Page ==
/// One page of listing results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutPage {
    pub items: Vec<Checkout>,
    /// Present when more records follow this page
    pub next_cursor: Option<String>,
    /// True when served from the list cache without touching the store
    pub cached: bool,
}

impl CheckoutPage {
    fn from_cached(page: CachedPage, cached: bool) -> Self {
        Self {
            items: page.items,
            next_cursor: page.next_cursor,
            cached,
        }
    }
}

// == Listing Service ==
/// Tenant-scoped checkout listing with a write-invalidated read cache.
pub struct ListingService {
    store: Arc<dyn CheckoutStore>,
    cache: Arc<dyn ListCache>,
    locks: TenantLocks,
}

impl ListingService {
    // == Constructor ==
    /// Builds a service over injected store and cache implementations.
    pub fn new(store: Arc<dyn CheckoutStore>, cache: Arc<dyn ListCache>) -> Self {
        Self {
            store,
            cache,
            locks: TenantLocks::new(),
        }
    }

    /// Builds a service backed by the in-memory store and cache.
    pub fn from_config(config: &Config) -> Self {
        let cache = MemoryListCache::new(config.cache_ttl, config.cache_max_entries);
        Self::new(Arc::new(MemoryStore::new()), Arc::new(cache))
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    // == Create ==
    /// Creates a checkout in status `initiated`.
    ///
    /// # Errors
    /// - `InvalidInput` for empty or oversized identifiers or a bad currency
    /// - `AlreadyExists` when the identifier is taken within the tenant
    pub async fn create_checkout(&self, new: NewCheckout) -> Result<Checkout> {
        let tenant_id = validate_id("tenant_id", &new.tenant_id)?.to_string();
        let id = match new.id.as_deref() {
            Some(id) => validate_id("id", id)?.to_string(),
            None => Uuid::now_v7().to_string(),
        };
        validate_id("cart_id", &new.cart_id)?;
        validate_id("customer_id", &new.customer_id)?;
        let currency = normalize_currency(&new.currency).ok_or_else(|| {
            CheckoutError::InvalidInput(format!("Invalid currency code '{}'", new.currency))
        })?;

        let _guard = self.locks.write(&tenant_id).await;

        // Stamped under the guard so commit order matches timestamp order.
        let now = now_micros();
        let checkout = Checkout {
            id,
            tenant_id,
            cart_id: new.cart_id,
            customer_id: new.customer_id,
            status: CheckoutStatus::Initiated,
            currency,
            created_at: now,
            updated_at: now,
        };

        self.store.put(checkout.clone()).await?;
        self.invalidate(&checkout.tenant_id).await;

        info!(tenant = %checkout.tenant_id, id = %checkout.id, "checkout created");
        Ok(checkout)
    }

    // == Get ==
    /// Looks up a single checkout. Not cached.
    pub async fn get_checkout(&self, tenant_id: &str, id: &str) -> Result<Checkout> {
        validate_id("tenant_id", tenant_id)?;
        validate_id("id", id)?;
        self.store.get(tenant_id, id).await
    }

    // == Update Status ==
    /// Moves a checkout to `status`.
    ///
    /// Setting the current status again returns the record unchanged;
    /// any transition other than out of `initiated` is `InvalidInput`.
    pub async fn update_status(
        &self,
        tenant_id: &str,
        id: &str,
        status: CheckoutStatus,
    ) -> Result<Checkout> {
        validate_id("tenant_id", tenant_id)?;
        validate_id("id", id)?;

        let _guard = self.locks.write(tenant_id).await;
        let mut checkout = self.store.get(tenant_id, id).await?;

        if checkout.status == status {
            return Ok(checkout);
        }
        if !checkout.status.can_transition_to(status) {
            return Err(CheckoutError::InvalidInput(format!(
                "Cannot move checkout '{}' from {} to {}",
                id, checkout.status, status
            )));
        }

        checkout.status = status;
        checkout.updated_at = now_micros().max(checkout.updated_at);
        self.store.replace(checkout.clone()).await?;
        self.invalidate(tenant_id).await;

        info!(tenant = %tenant_id, id = %id, status = %status, "checkout status updated");
        Ok(checkout)
    }

    // == Delete ==
    /// Removes a checkout and invalidates the tenant's cached pages.
    pub async fn delete_checkout(&self, tenant_id: &str, id: &str) -> Result<()> {
        validate_id("tenant_id", tenant_id)?;
        validate_id("id", id)?;

        let _guard = self.locks.write(tenant_id).await;
        self.store.delete(tenant_id, id).await?;
        self.invalidate(tenant_id).await;

        info!(tenant = %tenant_id, id = %id, "checkout deleted");
        Ok(())
    }

    // == List ==
    /// Lists one page of a tenant's checkouts in (created-at, id) order.
    ///
    /// A repeated call with identical parameters and no intervening
    /// mutation is answered from the cache with `cached = true`.
    ///
    /// # Errors
    /// - `InvalidInput` for a bad tenant, limit or currency filter
    /// - `MalformedCursor` when the cursor cannot be decoded
    pub async fn list_checkouts(&self, query: ListQuery) -> Result<CheckoutPage> {
        let tenant_id = validate_id("tenant_id", &query.tenant_id)?;
        let limit = effective_limit(query.limit)?;
        let token = query.cursor.as_deref().filter(|c| !c.is_empty());
        let after = token.map(cursor::decode).transpose()?;
        let currency = match query.currency.as_deref().filter(|c| !c.is_empty()) {
            Some(code) => Some(normalize_currency(code).ok_or_else(|| {
                CheckoutError::InvalidInput(format!("Invalid currency filter '{}'", code))
            })?),
            None => None,
        };

        let fingerprint =
            Fingerprint::new(tenant_id, token, query.status, currency.as_deref(), limit);

        let _guard = self.locks.read(tenant_id).await;
        let use_cache = self.cache_is_trusted(tenant_id).await;

        if !use_cache {
            debug!(tenant = %tenant_id, "tenant cache is stale, bypassing");
        } else if let Some(page) = self.cached_page(&fingerprint).await {
            debug!(%fingerprint, items = page.items.len(), "list served from cache");
            return Ok(CheckoutPage::from_cached(page, true));
        }

        let scan = self
            .store
            .scan(
                tenant_id,
                &ScanQuery {
                    after,
                    status: query.status,
                    currency,
                    limit,
                },
            )
            .await?;

        let next_cursor = if scan.has_more {
            scan.items
                .last()
                .map(|last| cursor::encode(last.created_at, &last.id))
        } else {
            None
        };

        let page = CachedPage {
            fingerprint: fingerprint.digest().to_string(),
            items: scan.items,
            next_cursor,
        };
        debug!(%fingerprint, items = page.items.len(), "list computed from store");

        if use_cache {
            if let Err(err) = self.cache.put(fingerprint, page.clone()).await {
                warn!(error = %err, "failed to cache list page");
            }
        }

        Ok(CheckoutPage::from_cached(page, false))
    }

    // == Cache Helpers ==
    /// Cache lookup that turns every failure into a miss.
    async fn cached_page(&self, fingerprint: &Fingerprint) -> Option<CachedPage> {
        match self.cache.get(fingerprint).await {
            Ok(Some(page)) if page.fingerprint == fingerprint.digest() => Some(page),
            Ok(Some(_)) => {
                warn!(%fingerprint, "cached page fingerprint mismatch, treating as miss");
                None
            }
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "list cache lookup failed, treating as miss");
                None
            }
        }
    }

    /// Drops the tenant's cached pages. Must run under the tenant's write guard.
    ///
    /// A failure is logged and marks the tenant stale, so readers bypass
    /// the cache until a later invalidation succeeds.
    async fn invalidate(&self, tenant_id: &str) {
        match self.cache.invalidate_tenant(tenant_id).await {
            Ok(removed) => {
                self.locks.clear_stale(tenant_id).await;
                debug!(tenant = %tenant_id, removed, "tenant cache invalidated");
            }
            Err(err) => {
                self.locks.mark_stale(tenant_id).await;
                warn!(tenant = %tenant_id, error = %err, "tenant cache invalidation failed, marked stale");
            }
        }
    }

    /// Whether cached pages of the tenant may be served and filled.
    ///
    /// A stale tenant retries its invalidation first; only a successful
    /// retry makes the cache trusted again.
    async fn cache_is_trusted(&self, tenant_id: &str) -> bool {
        if !self.locks.is_stale(tenant_id).await {
            return true;
        }
        match self.cache.invalidate_tenant(tenant_id).await {
            Ok(removed) => {
                self.locks.clear_stale(tenant_id).await;
                info!(tenant = %tenant_id, removed, "stale tenant cache invalidated on retry");
                true
            }
            Err(err) => {
                warn!(tenant = %tenant_id, error = %err, "stale tenant cache still unreachable");
                false
            }
        }
    }

    // == Sweep ==
    /// Removes expired cache pages and forgets tenants nobody is using.
    ///
    /// Returns the number of expired pages removed.
    pub async fn sweep(&self) -> CacheResult<usize> {
        let pruned = self.locks.prune_idle().await;
        if pruned > 0 {
            debug!(pruned, "idle tenant locks pruned");
        }
        self.cache.sweep_expired().await
    }
}

// == Validation ==
fn validate_id<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(CheckoutError::InvalidInput(format!("{} cannot be empty", field)));
    }
    if value.len() > MAX_ID_LENGTH {
        return Err(CheckoutError::InvalidInput(format!(
            "{} exceeds maximum length of {} bytes",
            field, MAX_ID_LENGTH
        )));
    }
    Ok(value)
}

/// Absent → [`DEFAULT_LIMIT`], non-positive → error, above [`MAX_LIMIT`] → clamped.
fn effective_limit(limit: Option<i64>) -> Result<usize> {
    match limit {
        None => Ok(DEFAULT_LIMIT),
        Some(n) if n <= 0 => Err(CheckoutError::InvalidInput(format!(
            "limit must be positive, got {}",
            n
        ))),
        Some(n) => Ok(usize::try_from(n).unwrap_or(MAX_LIMIT).min(MAX_LIMIT)),
    }
}
