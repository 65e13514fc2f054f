//! Cache usage counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served fresh from the cache.
    pub hits: u64,
    /// Reads served stale from the cache.
    pub stale_hits: u64,
    /// Reads that found nothing cached and started a fetch.
    pub misses: u64,
    /// Reads that found nothing cached and joined a fetch already in flight.
    pub deduplicated: u64,
    /// Underlying fetches started.
    pub fetches: u64,
    /// Underlying fetches that failed.
    pub failed_fetches: u64,
    /// Entries removed by garbage collection.
    pub evictions: u64,
    /// Entries currently held.
    pub entry_count: u64,
}

impl CacheStats {
    /// Share of reads answered from the cache, stale or not (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.stale_hits;
        let total = served + self.misses + self.deduplicated;
        if total == 0 {
            0.0
        } else {
            served as f64 / total as f64
        }
    }
}

/// Live counters behind [`CacheStats`].
#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    pub hits: AtomicU64,
    pub stale_hits: AtomicU64,
    pub misses: AtomicU64,
    pub deduplicated: AtomicU64,
    pub fetches: AtomicU64,
    pub failed_fetches: AtomicU64,
    pub evictions: AtomicU64,
}

impl CacheCounters {
    pub fn bump(counter: &AtomicU64) {
        Self::add(counter, 1);
    }

    pub fn add(counter: &AtomicU64, amount: u64) {
        counter.fetch_add(amount, Ordering::Relaxed);
    }

    pub fn snapshot(&self, entry_count: u64) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            stale_hits: self.stale_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            deduplicated: self.deduplicated.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            failed_fetches: self.failed_fetches.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entry_count,
        }
    }
}
