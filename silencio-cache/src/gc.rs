//! Background eviction of unused queries.
//!
//! Runs [`QueryCache::collect_garbage`] on a fixed interval until told to
//! stop. The sweep itself only removes entries that are unobserved, not
//! fetching, and unused for their GC window.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::query_cache::QueryCache;

/// Spawn the collector task.
///
/// The task stops when `shutdown_rx` observes `true` or its sender is dropped,
/// and resolves to the total number of entries it evicted.
///
/// # Example
///
/// ```ignore
/// let (shutdown_tx, shutdown_rx) = watch::channel(false);
/// let handle = spawn_collector(cache.clone(), Duration::from_secs(60), shutdown_rx);
///
/// // Later, trigger shutdown
/// let _ = shutdown_tx.send(true);
/// let evicted = handle.await?;
/// ```
pub fn spawn_collector<T>(
    cache: QueryCache<T>,
    every: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<u64>
where
    T: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut total = 0u64;

        tracing::info!(interval_ms = every.as_millis() as u64, "Query collector started");

        loop {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let evicted = cache.collect_garbage();
                    if evicted > 0 {
                        total += evicted as u64;
                        tracing::info!(evicted, remaining = cache.len(), "Evicted unused queries");
                    } else {
                        tracing::trace!("Query collection found nothing to evict");
                    }
                }
            }
        }

        tracing::info!(total_evicted = total, "Query collector stopped");
        total
    })
}
