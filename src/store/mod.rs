//! Record Store Module
//!
//! Tenant-partitioned storage of checkout records with ordered scans.
//! The listing service only talks to [`CheckoutStore`], so a database-backed
//! implementation can replace [`MemoryStore`] without touching orchestration.

mod memory;

use async_trait::async_trait;

use crate::cursor::CursorPosition;
use crate::error::Result;
use crate::models::{Checkout, CheckoutStatus};

pub use memory::MemoryStore;

// == Scan Query ==
/// Parameters of an ordered, filtered scan over one tenant partition.
#[derive(Debug, Clone, Default)]
pub struct ScanQuery {
    /// Exclusive lower bound; records at or before it are skipped
    pub after: Option<CursorPosition>,
    pub status: Option<CheckoutStatus>,
    /// Upper-case currency code
    pub currency: Option<String>,
    /// Maximum number of records to return
    pub limit: usize,
}

impl ScanQuery {
    /// Whether `checkout` passes the status and currency filters.
    pub fn matches(&self, checkout: &Checkout) -> bool {
        self.status.map_or(true, |s| checkout.status == s)
            && self
                .currency
                .as_deref()
                .map_or(true, |c| checkout.currency == c)
    }
}

// == Scan Result ==
/// One page of a scan, in (created-at, identifier) order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub items: Vec<Checkout>,
    /// True when matching records exist beyond `items`
    pub has_more: bool,
}

// == Checkout Store Trait ==
/// Storage collaborator for checkout records.
///
/// Every method is scoped to a single tenant; implementations must never
/// return or modify another tenant's records, even on identifier collisions.
#[async_trait]
pub trait CheckoutStore: Send + Sync {
    /// Inserts a new checkout. Fails with `AlreadyExists` on a duplicate id.
    async fn put(&self, checkout: Checkout) -> Result<()>;

    /// Replaces an existing checkout, keeping its position. Fails with `NotFound`.
    async fn replace(&self, checkout: Checkout) -> Result<()>;

    /// Looks up a checkout by identifier.
    async fn get(&self, tenant_id: &str, id: &str) -> Result<Checkout>;

    /// Returns up to `query.limit` matching checkouts after `query.after`.
    async fn scan(&self, tenant_id: &str, query: &ScanQuery) -> Result<ScanResult>;

    /// Removes a checkout, returning it. Fails with `NotFound`.
    async fn delete(&self, tenant_id: &str, id: &str) -> Result<Checkout>;
}
