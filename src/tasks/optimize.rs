//! Cache Optimization Task
//!
//! Background task that periodically drops expired memory entries and sweeps
//! expired or corrupted disk records.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::TieredCache;

/// Spawns a background task that optimizes `cache` every `interval`.
///
/// The sweep does blocking filesystem work, so each run is moved onto the
/// blocking pool. Abort the returned handle to stop the task.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(TieredCache::<serde_json::Value>::new("./cache", 1000)?);
/// let optimize_handle = spawn_optimize_task(cache.clone(), Duration::from_secs(300));
/// // Later, during shutdown:
/// optimize_handle.abort();
/// ```
pub fn spawn_optimize_task<V>(cache: Arc<TieredCache<V>>, interval: Duration) -> JoinHandle<()>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(
            interval_secs = interval.as_secs_f64(),
            "Starting cache optimization task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let cache = Arc::clone(&cache);
            let swept = tokio::task::spawn_blocking(move || {
                (cache.purge_expired_memory(), cache.optimize_cache())
            })
            .await;

            match swept {
                Ok((0, 0)) => debug!("Cache optimization: nothing to remove"),
                Ok((memory, disk)) => info!(
                    memory_entries = memory,
                    disk_records = disk,
                    "Cache optimization removed expired items"
                ),
                Err(e) => warn!(error = %e, "Cache optimization run did not complete"),
            }
        }
    })
}
