//! Cache Sweep Task
//!
//! Background task that periodically removes expired list cache pages and
//! forgets idle tenants. Expiry is already enforced on every lookup; the
//! sweep only bounds memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::service::ListingService;

/// Spawns a background task that periodically sweeps the listing service.
///
/// # Arguments
/// * `service` - Shared handle to the listing service
/// * `cleanup_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_cleanup_task(state.service.clone(), 30);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task(
    service: Arc<ListingService>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting list cache sweep task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            match service.sweep().await {
                Ok(0) => debug!("Cache sweep: no expired pages found"),
                Ok(removed) => info!("Cache sweep: removed {} expired pages", removed),
                Err(err) => warn!(error = %err, "Cache sweep failed"),
            }
        }
    })
}
