//! In-memory record store
//!
//! Each tenant gets its own partition behind its own lock, so work on one
//! tenant never waits on another.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CheckoutStore, ScanQuery, ScanResult};
use crate::error::{CheckoutError, Result};
use crate::models::Checkout;

/// (created-at micros, identifier)
type SortKey = (i64, String);

// == Tenant Partition ==
#[derive(Debug, Default)]
struct TenantPartition {
    /// Records in listing order
    ordered: BTreeMap<SortKey, Checkout>,
    /// Identifier to position index
    positions: HashMap<String, SortKey>,
}

impl TenantPartition {
    fn sort_key(checkout: &Checkout) -> SortKey {
        (checkout.created_at.timestamp_micros(), checkout.id.clone())
    }
}

// == Memory Store ==
/// Thread-safe in-memory [`CheckoutStore`].
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tenants: Arc<RwLock<HashMap<String, Arc<RwLock<TenantPartition>>>>>,
}

impl MemoryStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the partition of an existing tenant.
    async fn partition(&self, tenant_id: &str) -> Option<Arc<RwLock<TenantPartition>>> {
        self.tenants.read().await.get(tenant_id).cloned()
    }

    /// Returns the partition of a tenant, creating it on first write.
    async fn partition_or_create(&self, tenant_id: &str) -> Arc<RwLock<TenantPartition>> {
        if let Some(partition) = self.partition(tenant_id).await {
            return partition;
        }
        let mut tenants = self.tenants.write().await;
        tenants.entry(tenant_id.to_string()).or_default().clone()
    }

    /// Number of records held for a tenant.
    pub async fn len(&self, tenant_id: &str) -> usize {
        match self.partition(tenant_id).await {
            Some(partition) => partition.read().await.ordered.len(),
            None => 0,
        }
    }
}

#[async_trait]
impl CheckoutStore for MemoryStore {
    async fn put(&self, checkout: Checkout) -> Result<()> {
        let partition = self.partition_or_create(&checkout.tenant_id).await;
        let mut partition = partition.write().await;

        if partition.positions.contains_key(&checkout.id) {
            return Err(CheckoutError::AlreadyExists(checkout.id));
        }

        let key = TenantPartition::sort_key(&checkout);
        partition.positions.insert(checkout.id.clone(), key.clone());
        partition.ordered.insert(key, checkout);
        Ok(())
    }

    async fn replace(&self, checkout: Checkout) -> Result<()> {
        let partition = self
            .partition(&checkout.tenant_id)
            .await
            .ok_or_else(|| CheckoutError::NotFound(checkout.id.clone()))?;
        let mut partition = partition.write().await;

        let key = partition
            .positions
            .get(&checkout.id)
            .cloned()
            .ok_or_else(|| CheckoutError::NotFound(checkout.id.clone()))?;

        if key != TenantPartition::sort_key(&checkout) {
            return Err(CheckoutError::InvalidInput(format!(
                "created_at of checkout '{}' is immutable",
                checkout.id
            )));
        }

        partition.ordered.insert(key, checkout);
        Ok(())
    }

    async fn get(&self, tenant_id: &str, id: &str) -> Result<Checkout> {
        let not_found = || CheckoutError::NotFound(id.to_string());
        let partition = self.partition(tenant_id).await.ok_or_else(not_found)?;
        let partition = partition.read().await;

        partition
            .positions
            .get(id)
            .and_then(|key| partition.ordered.get(key))
            .cloned()
            .ok_or_else(not_found)
    }

    async fn scan(&self, tenant_id: &str, query: &ScanQuery) -> Result<ScanResult> {
        let Some(partition) = self.partition(tenant_id).await else {
            return Ok(ScanResult::default());
        };
        let partition = partition.read().await;

        let lower = match &query.after {
            Some(pos) => Bound::Excluded((pos.timestamp.timestamp_micros(), pos.id.clone())),
            None => Bound::Unbounded,
        };

        // One extra record tells us whether another page exists.
        let mut items: Vec<Checkout> = partition
            .ordered
            .range((lower, Bound::Unbounded))
            .map(|(_, checkout)| checkout)
            .filter(|checkout| query.matches(checkout))
            .take(query.limit.saturating_add(1))
            .cloned()
            .collect();

        let has_more = items.len() > query.limit;
        items.truncate(query.limit);

        Ok(ScanResult { items, has_more })
    }

    async fn delete(&self, tenant_id: &str, id: &str) -> Result<Checkout> {
        let not_found = || CheckoutError::NotFound(id.to_string());
        let partition = self.partition(tenant_id).await.ok_or_else(not_found)?;
        let mut partition = partition.write().await;

        let key = partition.positions.remove(id).ok_or_else(not_found)?;
        partition.ordered.remove(&key).ok_or_else(not_found)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::CursorPosition;
    use crate::models::CheckoutStatus;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn checkout(tenant: &str, id: &str, offset_us: i64) -> Checkout {
        let ts = base_time() + Duration::microseconds(offset_us);
        Checkout {
            id: id.to_string(),
            tenant_id: tenant.to_string(),
            cart_id: format!("cart-{}", id),
            customer_id: "cust-1".to_string(),
            status: CheckoutStatus::Initiated,
            currency: "USD".to_string(),
            created_at: ts,
            updated_at: ts,
        }
    }

    fn ids(result: &ScanResult) -> Vec<&str> {
        result.items.iter().map(|c| c.id.as_str()).collect()
    }

    fn query(limit: usize) -> ScanQuery {
        ScanQuery {
            limit,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryStore::new();
        store.put(checkout("t1", "co1", 0)).await.unwrap();

        let found = store.get("t1", "co1").await.unwrap();
        assert_eq!(found.cart_id, "cart-co1");
        assert_eq!(store.len("t1").await, 1);
    }

    #[tokio::test]
    async fn test_put_duplicate() {
        let store = MemoryStore::new();
        store.put(checkout("t1", "co1", 0)).await.unwrap();

        let result = store.put(checkout("t1", "co1", 5)).await;
        assert!(matches!(result, Err(CheckoutError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get("t1", "nope").await,
            Err(CheckoutError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_scan_orders_by_time_then_id() {
        let store = MemoryStore::new();
        store.put(checkout("t1", "b", 10)).await.unwrap();
        store.put(checkout("t1", "c", 0)).await.unwrap();
        store.put(checkout("t1", "a", 10)).await.unwrap();

        let result = store.scan("t1", &query(10)).await.unwrap();
        assert_eq!(ids(&result), vec!["c", "a", "b"]);
        assert!(!result.has_more);
    }

    #[tokio::test]
    async fn test_scan_after_cursor_is_exclusive() {
        let store = MemoryStore::new();
        store.put(checkout("t1", "a", 10)).await.unwrap();
        store.put(checkout("t1", "b", 10)).await.unwrap();
        store.put(checkout("t1", "c", 20)).await.unwrap();

        let after = CursorPosition::new(base_time() + Duration::microseconds(10), "a");
        let result = store
            .scan(
                "t1",
                &ScanQuery {
                    after: Some(after),
                    limit: 10,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(ids(&result), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_scan_limit_and_has_more() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.put(checkout("t1", &format!("co{}", i), i)).await.unwrap();
        }

        let page = store.scan("t1", &query(2)).await.unwrap();
        assert_eq!(ids(&page), vec!["co0", "co1"]);
        assert!(page.has_more);

        let page = store.scan("t1", &query(5)).await.unwrap();
        assert_eq!(page.items.len(), 5);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_scan_filters() {
        let store = MemoryStore::new();
        let mut eur = checkout("t1", "eur", 1);
        eur.currency = "EUR".to_string();
        let mut done = checkout("t1", "done", 2);
        done.status = CheckoutStatus::Completed;
        store.put(checkout("t1", "usd", 0)).await.unwrap();
        store.put(eur).await.unwrap();
        store.put(done).await.unwrap();

        let by_currency = store
            .scan(
                "t1",
                &ScanQuery {
                    currency: Some("EUR".to_string()),
                    limit: 10,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(ids(&by_currency), vec!["eur"]);

        let by_status = store
            .scan(
                "t1",
                &ScanQuery {
                    status: Some(CheckoutStatus::Completed),
                    limit: 10,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(ids(&by_status), vec!["done"]);
    }

    #[tokio::test]
    async fn test_has_more_respects_filters() {
        let store = MemoryStore::new();
        store.put(checkout("t1", "a", 0)).await.unwrap();
        let mut other = checkout("t1", "b", 1);
        other.currency = "EUR".to_string();
        store.put(other).await.unwrap();

        let result = store
            .scan(
                "t1",
                &ScanQuery {
                    currency: Some("USD".to_string()),
                    limit: 1,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(ids(&result), vec!["a"]);
        assert!(!result.has_more);
    }

    #[tokio::test]
    async fn test_tenant_isolation_with_colliding_ids() {
        let store = MemoryStore::new();
        store.put(checkout("t1", "co1", 0)).await.unwrap();
        store.put(checkout("t2", "co1", 0)).await.unwrap();

        store.delete("t1", "co1").await.unwrap();

        assert!(store.get("t1", "co1").await.is_err());
        assert!(store.get("t2", "co1").await.is_ok());
        assert_eq!(store.scan("t2", &query(10)).await.unwrap().items.len(), 1);
        assert!(store.scan("t3", &query(10)).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let store = MemoryStore::new();
        store.put(checkout("t1", "co1", 0)).await.unwrap();
        assert!(matches!(
            store.delete("t1", "co2").await,
            Err(CheckoutError::NotFound(_))
        ));
        assert!(matches!(
            store.delete("t9", "co1").await,
            Err(CheckoutError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_replace_keeps_position() {
        let store = MemoryStore::new();
        store.put(checkout("t1", "a", 0)).await.unwrap();
        store.put(checkout("t1", "b", 1)).await.unwrap();

        let mut updated = store.get("t1", "a").await.unwrap();
        updated.status = CheckoutStatus::Completed;
        store.replace(updated).await.unwrap();

        let result = store.scan("t1", &query(10)).await.unwrap();
        assert_eq!(ids(&result), vec!["a", "b"]);
        assert_eq!(result.items[0].status, CheckoutStatus::Completed);
    }

    #[tokio::test]
    async fn test_replace_rejects_moved_created_at() {
        let store = MemoryStore::new();
        store.put(checkout("t1", "a", 0)).await.unwrap();

        let moved = checkout("t1", "a", 99);
        assert!(matches!(
            store.replace(moved).await,
            Err(CheckoutError::InvalidInput(_))
        ));
        assert!(matches!(
            store.replace(checkout("t1", "zzz", 0)).await,
            Err(CheckoutError::NotFound(_))
        ));
    }
}
