//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries.
//! Reads already skip expired entries and writes sweep once per interval,
//! so this only matters for a cache that stops receiving writes.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{ExpiringStore, Expiry};

/// Spawns a background task that periodically cleans up expired cache entries.
///
/// The task runs in an infinite loop, sleeping for `interval` between
/// cleanup runs. Abort it through the returned handle on shutdown.
///
/// # Example
/// ```ignore
/// let service = CacheService::new(Arc::new(TtlConfig::default()));
/// let cleanup_handle = spawn_cleanup_task(service.store().clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<E>(store: Arc<ExpiringStore<E>>, interval: Duration) -> JoinHandle<()>
where
    E: Expiry + 'static,
{
    tokio::spawn(async move {
        info!(?interval, "Starting TTL cleanup task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.cleanup_expired();

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
