//! silencio Cache - Query Cache with Freshness Contracts
//!
//! A read-through cache for remote queries. Each entry is keyed by a
//! [`QueryKey`](silencio_core::QueryKey) and follows stale-while-revalidate
//! semantics:
//!
//! - fresh data is served without a fetch
//! - stale data is served immediately while one background refresh runs
//! - concurrent reads with nothing cached share a single in-flight fetch
//! - a failed fetch never replaces cached data
//! - unobserved entries are evicted once their GC window has elapsed
//!
//! # Example
//!
//! ```ignore
//! let cache = QueryCache::with_defaults();
//! let config = QueryConfig::default();
//!
//! match cache.get(&key, fetcher.clone(), &config).await? {
//!     QueryOutcome::Ready(read) if read.is_stale() => render_with_spinner(read.value()),
//!     QueryOutcome::Ready(read) => render(read.value()),
//!     QueryOutcome::Inactive => {}
//! }
//! ```

pub mod entry;
pub mod freshness;
pub mod gc;
mod inflight;
pub mod observer;
pub mod query_cache;
pub mod stats;

pub use entry::EntrySnapshot;
pub use freshness::{CacheRead, EntryStatus, QueryOutcome};
pub use gc::spawn_collector;
pub use observer::QueryObserver;
pub use query_cache::QueryCache;
pub use stats::CacheStats;
