//! Expiry Sweep Task
//!
//! Background task that periodically removes expired entries from the
//! in-memory store, so expired values are reclaimed even when never read.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::MemoryCache;

/// Spawns a background task that sweeps expired entries every `interval`.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let store = MemoryStore::new(1000);
/// let cleanup_handle = spawn_cleanup_task(store.shared(), Duration::from_secs(1));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(cache: Arc<RwLock<MemoryCache>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval = ?interval, "Starting expiry sweep task");

        loop {
            tokio::time::sleep(interval).await;

            let (removed, remaining) = {
                let mut guard = cache.write().await;
                (guard.cleanup_expired(), guard.len())
            };

            if removed > 0 {
                info!(removed, remaining, "Expiry sweep removed entries");
            } else {
                debug!(remaining, "Expiry sweep found nothing to remove");
            }
        }
    })
}
