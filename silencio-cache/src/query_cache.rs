//! Stale-while-revalidate query cache.
//!
//! Routes each read by the entry's state: fresh data is returned as is, stale
//! data is returned while a background refresh runs, and a read with nothing
//! cached waits on the (possibly shared) fetch.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use silencio_core::{BackoffConfig, FetchError, FetchResult, QueryConfig, QueryFetcher, QueryKey};
use tokio::time::Instant;

use crate::entry::{Entry, EntrySnapshot};
use crate::freshness::{CacheRead, QueryOutcome};
use crate::inflight::{InFlight, SharedFetch};
use crate::observer::QueryObserver;
use crate::stats::{CacheCounters, CacheStats};

pub(crate) struct CacheState<T> {
    pub entries: HashMap<QueryKey, Entry<T>>,
    /// Live observer counts. Kept apart from `entries` so observing a query
    /// never creates an entry.
    pub observers: HashMap<QueryKey, usize>,
}

impl<T> CacheState<T> {
    pub fn observers_of(&self, key: &QueryKey) -> usize {
        self.observers.get(key).copied().unwrap_or(0)
    }
}

/// Why a fetch was started. Only background refresh failures are swallowed,
/// so only those are logged as warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchOrigin {
    /// A read with nothing cached.
    Miss,
    /// A stale read refreshing behind the cached value.
    Background,
    /// An explicit `refresh`, whose caller receives the result.
    Refresh,
}

pub(crate) struct Inner<T> {
    state: Mutex<CacheState<T>>,
    backoff: BackoffConfig,
    pub counters: CacheCounters,
}

impl<T> Inner<T> {
    /// The lock is never held across an await, so a poisoned guard only means
    /// a panic elsewhere; the map itself is still consistent.
    pub fn lock(&self) -> MutexGuard<'_, CacheState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Inner<T> {
    fn commit(&self, key: &QueryKey, result: &FetchResult<T>, origin: FetchOrigin) {
        let mut state = self.lock();
        let Some(entry) = state.entries.get_mut(key) else {
            return;
        };
        let had_data = entry.data.is_some();
        entry.commit(result, &self.backoff);

        match result {
            Ok(_) => tracing::debug!(key = %key, "Query fetch succeeded"),
            Err(err) => {
                CacheCounters::bump(&self.counters.failed_fetches);
                if had_data && origin == FetchOrigin::Background {
                    tracing::warn!(
                        key = %key,
                        error = %err,
                        failures = entry.failures,
                        "Background refresh failed, keeping cached data"
                    );
                } else {
                    tracing::debug!(
                        key = %key,
                        error = %err,
                        origin = ?origin,
                        kept_data = had_data,
                        "Query fetch failed"
                    );
                }
            }
        }
    }
}

/// Process-wide query cache.
///
/// Cloning is cheap and every clone shares the same store, so one instance is
/// created at startup and handed to each consumer.
///
/// # Example
///
/// ```ignore
/// let cache = QueryCache::new(BackoffConfig::default());
/// let outcome = cache.get(&QueryKey::teacher_verification(), fetcher, &config).await?;
/// ```
pub struct QueryCache<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for QueryCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> QueryCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an empty cache using `backoff` for failed background refreshes.
    pub fn new(backoff: BackoffConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(CacheState {
                    entries: HashMap::new(),
                    observers: HashMap::new(),
                }),
                backoff,
                counters: CacheCounters::default(),
            }),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(BackoffConfig::default())
    }

    pub fn backoff(&self) -> &BackoffConfig {
        &self.inner.backoff
    }

    /// Read a query, fetching through `fetcher` when needed.
    ///
    /// - Disabled: returns [`QueryOutcome::Inactive`] without fetching or
    ///   touching any entry.
    /// - Fresh data: returned from the cache.
    /// - Stale data: returned from the cache; one background refresh is
    ///   started unless a fetch is already running or backing off. A failure
    ///   of that refresh is not reported here.
    /// - No data: waits on the in-flight fetch, starting one if needed, and
    ///   returns its result. Failures are not cached, so the next enabled read
    ///   fetches again.
    pub async fn get<F>(
        &self,
        key: &QueryKey,
        fetcher: Arc<F>,
        config: &QueryConfig,
    ) -> FetchResult<QueryOutcome<T>>
    where
        F: QueryFetcher<T> + ?Sized + 'static,
    {
        if !config.enabled {
            tracing::trace!(key = %key, "Query disabled, skipping");
            return Ok(QueryOutcome::Inactive);
        }

        let pending = {
            let now = Instant::now();
            let mut state = self.inner.lock();
            let entry = state
                .entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(now, config));
            entry.touch(now, config);

            if let Some(read) = entry.read(now) {
                if read.is_stale() {
                    CacheCounters::bump(&self.inner.counters.stale_hits);
                    if entry.may_refresh(now) {
                        tracing::debug!(key = %key, "Serving stale data, refreshing in background");
                        let _ = self.start_fetch(entry, key, fetcher, FetchOrigin::Background);
                    }
                } else {
                    CacheCounters::bump(&self.inner.counters.hits);
                }
                return Ok(QueryOutcome::Ready(read));
            }

            match entry.in_flight.as_ref().map(InFlight::join) {
                Some(pending) => {
                    CacheCounters::bump(&self.inner.counters.deduplicated);
                    tracing::debug!(key = %key, "Joining in-flight fetch");
                    pending
                }
                None => {
                    CacheCounters::bump(&self.inner.counters.misses);
                    self.start_fetch(entry, key, fetcher, FetchOrigin::Miss)
                }
            }
        };

        let read = self.await_fetch(key, pending).await?;
        Ok(QueryOutcome::Ready(read))
    }

    /// Refresh a query and wait for the result, joining a fetch already in
    /// flight. Unlike [`get`](Self::get) this reports refresh failures even
    /// when cached data exists; the cached data is kept either way.
    pub async fn refresh<F>(
        &self,
        key: &QueryKey,
        fetcher: Arc<F>,
        config: &QueryConfig,
    ) -> FetchResult<CacheRead<T>>
    where
        F: QueryFetcher<T> + ?Sized + 'static,
    {
        let pending = {
            let now = Instant::now();
            let mut state = self.inner.lock();
            let entry = state
                .entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(now, config));
            entry.touch(now, config);

            match entry.in_flight.as_ref().map(InFlight::join) {
                Some(pending) => {
                    CacheCounters::bump(&self.inner.counters.deduplicated);
                    pending
                }
                None => self.start_fetch(entry, key, fetcher, FetchOrigin::Refresh),
            }
        };

        self.await_fetch(key, pending).await
    }

    /// Register a fetch for `entry` and return a handle to wait on.
    ///
    /// Must be called with the state lock held so that no second fetch can be
    /// registered for the same key in between. A panicking fetcher is reported
    /// as a transport failure so the entry never stays stuck in flight.
    fn start_fetch<F>(
        &self,
        entry: &mut Entry<T>,
        key: &QueryKey,
        fetcher: Arc<F>,
        origin: FetchOrigin,
    ) -> SharedFetch<T>
    where
        F: QueryFetcher<T> + ?Sized + 'static,
    {
        CacheCounters::bump(&self.inner.counters.fetches);
        tracing::info!(key = %key, origin = ?origin, "Fetching query");

        let inner = Arc::clone(&self.inner);
        let fetch_key = key.clone();
        let in_flight = InFlight::launch(
            async move {
                let result = match AssertUnwindSafe(fetcher.fetch(&fetch_key)).catch_unwind().await {
                    Ok(result) => result,
                    Err(panic) => {
                        let message = panic_message(panic.as_ref());
                        tracing::error!(key = %fetch_key, panic = %message, "Query fetcher panicked");
                        Err(FetchError::transport(format!("fetcher panicked: {message}")))
                    }
                };
                inner.commit(&fetch_key, &result, origin);
                result
            },
            entry.generation,
        );
        let pending = in_flight.join();
        entry.in_flight = Some(in_flight);
        pending
    }

    async fn await_fetch(&self, key: &QueryKey, pending: SharedFetch<T>) -> FetchResult<CacheRead<T>> {
        let value = pending.await?;
        let updated_at = {
            let state = self.inner.lock();
            state
                .entries
                .get(key)
                .and_then(|entry| entry.data.as_ref())
                .map(|data| data.updated_at)
        };
        Ok(CacheRead::from_fetch(value, updated_at.unwrap_or_else(chrono::Utc::now)))
    }

    /// Cached data for `key`, without fetching or counting as an access.
    pub fn peek(&self, key: &QueryKey) -> Option<CacheRead<T>> {
        let state = self.inner.lock();
        state.entries.get(key).and_then(|entry| entry.read(Instant::now()))
    }

    pub fn state(&self, key: &QueryKey) -> EntrySnapshot {
        let state = self.inner.lock();
        let observers = state.observers_of(key);
        match state.entries.get(key) {
            Some(entry) => entry.snapshot(Instant::now(), observers),
            None => EntrySnapshot::idle(observers),
        }
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    /// Mark cached data stale so the next enabled read refreshes it in the
    /// background. Returns false when there is no data to invalidate.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let mut state = self.inner.lock();
        let invalidated = state
            .entries
            .get_mut(key)
            .is_some_and(|entry| entry.invalidate());
        if invalidated {
            tracing::debug!(key = %key, "Query invalidated");
        }
        invalidated
    }

    /// Seed `key` with a value as though a fetch had just succeeded.
    pub fn set_data(&self, key: &QueryKey, value: T, config: &QueryConfig) {
        let now = Instant::now();
        let mut state = self.inner.lock();
        let entry = state
            .entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(now, config));
        entry.touch(now, config);
        entry.store(value);
    }

    /// Drop an entry immediately. Refused while the entry is observed or a
    /// fetch for it is in flight.
    pub fn remove(&self, key: &QueryKey) -> bool {
        let mut state = self.inner.lock();
        let observers = state.observers_of(key);
        let removable = state
            .entries
            .get(key)
            .is_some_and(|entry| observers == 0 && !entry.is_fetching());
        if removable {
            state.entries.remove(key);
        }
        removable
    }

    /// Register a consumer of `key`. The entry is not evicted while any
    /// observer is alive.
    pub fn observe(&self, key: &QueryKey) -> QueryObserver<T> {
        QueryObserver::new(Arc::clone(&self.inner), key.clone())
    }

    /// Evict every entry that is unobserved, not fetching, and unused for
    /// longer than its GC window. Returns the number evicted.
    pub fn collect_garbage(&self) -> usize {
        let now = Instant::now();
        let mut state = self.inner.lock();
        let CacheState { entries, observers } = &mut *state;

        let before = entries.len();
        entries.retain(|key, entry| {
            let observed = observers.get(key).copied().unwrap_or(0);
            let collect = entry.is_collectable(now, observed);
            if collect {
                tracing::debug!(key = %key, "Evicting unused query");
            }
            !collect
        });
        let evicted = before - entries.len();

        CacheCounters::add(&self.inner.counters.evictions, evicted as u64);
        evicted
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let entry_count = self.len() as u64;
        self.inner.counters.snapshot(entry_count)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl<T> Default for QueryCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freshness::EntryStatus;
    use silencio_core::FetchError;
    use silencio_test_utils::MockFetcher;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    /// Counts WARN events.
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn key() -> QueryKey {
        QueryKey::from_static("numbers")
    }

    fn config() -> QueryConfig {
        QueryConfig::new()
            .with_stale_window(Duration::from_secs(60))
            .with_gc_window(Duration::from_secs(300))
    }

    /// Let spawned fetch drivers run to completion.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_miss_fetches_and_caches() {
        let cache = QueryCache::with_defaults();
        let fetcher = Arc::new(MockFetcher::always(Ok(vec![1u32, 2, 3])));

        let outcome = cache.get(&key(), fetcher.clone(), &config()).await.unwrap();
        let read = outcome.into_read().unwrap();

        assert!(read.was_cache_miss());
        assert_eq!(read.into_value(), vec![1, 2, 3]);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(cache.state(&key()).status, EntryStatus::Fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_read_does_nothing() {
        let cache: QueryCache<Vec<u32>> = QueryCache::with_defaults();
        let fetcher = Arc::new(MockFetcher::always(Ok(vec![1u32])));
        let disabled = config().with_enabled(false);

        for _ in 0..3 {
            let outcome = cache.get(&key(), fetcher.clone(), &disabled).await.unwrap();
            assert!(outcome.is_inactive());
        }

        assert_eq!(fetcher.calls(), 0);
        assert!(!cache.contains(&key()));
        assert_eq!(cache.state(&key()).status, EntryStatus::Idle);
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_read_returns_cached_and_refreshes_once() {
        let cache = QueryCache::with_defaults();
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.push(Ok(vec![1u32]));
        fetcher.push(Ok(vec![2u32]));

        cache.get(&key(), fetcher.clone(), &config()).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;

        let first = cache.get(&key(), fetcher.clone(), &config()).await.unwrap();
        let second = cache.get(&key(), fetcher.clone(), &config()).await.unwrap();
        assert_eq!(first.data(), Some(&vec![1]));
        assert!(first.read().unwrap().is_stale());
        assert_eq!(second.data(), Some(&vec![1]));

        settle().await;
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(cache.peek(&key()).unwrap().into_value(), vec![2]);
        assert_eq!(cache.state(&key()).status, EntryStatus::Fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_cached_data() {
        let cache = QueryCache::with_defaults();
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.push(Ok(vec![1u32]));
        fetcher.push(Err(FetchError::request_failed(500, "Internal Server Error")));

        cache.get(&key(), fetcher.clone(), &config()).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;

        let stale = cache.get(&key(), fetcher.clone(), &config()).await.unwrap();
        assert_eq!(stale.data(), Some(&vec![1]));
        settle().await;

        let snapshot = cache.state(&key());
        assert_eq!(snapshot.status, EntryStatus::Stale);
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.error.and_then(|e| e.status()), Some(500));
        assert_eq!(cache.peek(&key()).unwrap().into_value(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_suppresses_refresh_after_failure() {
        let cache = QueryCache::new(BackoffConfig {
            initial_ms: 10_000,
            max_ms: 60_000,
            multiplier: 2.0,
        });
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.push(Ok(vec![1u32]));
        fetcher.push(Err(FetchError::transport("connection reset")));
        fetcher.push(Ok(vec![3u32]));

        cache.get(&key(), fetcher.clone(), &config()).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        cache.get(&key(), fetcher.clone(), &config()).await.unwrap();
        settle().await;
        assert_eq!(fetcher.calls(), 2);

        cache.get(&key(), fetcher.clone(), &config()).await.unwrap();
        settle().await;
        assert_eq!(fetcher.calls(), 2);

        tokio::time::advance(Duration::from_secs(10)).await;
        cache.get(&key(), fetcher.clone(), &config()).await.unwrap();
        settle().await;
        assert_eq!(fetcher.calls(), 3);
        assert_eq!(cache.peek(&key()).unwrap().into_value(), vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_surfaces_error_but_keeps_data() {
        let cache = QueryCache::with_defaults();
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.push(Ok(vec![1u32]));
        fetcher.push(Err(FetchError::decode("expected array")));

        cache.get(&key(), fetcher.clone(), &config()).await.unwrap();
        let err = cache.refresh(&key(), fetcher.clone(), &config()).await.unwrap_err();

        assert_eq!(err, FetchError::decode("expected array"));
        assert_eq!(cache.peek(&key()).unwrap().into_value(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_marks_stale() {
        let cache = QueryCache::with_defaults();
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.push(Ok(vec![1u32]));
        fetcher.push(Ok(vec![2u32]));

        assert!(!cache.invalidate(&key()));
        cache.get(&key(), fetcher.clone(), &config()).await.unwrap();
        assert!(cache.invalidate(&key()));
        assert_eq!(cache.state(&key()).status, EntryStatus::Stale);

        let outcome = cache.get(&key(), fetcher.clone(), &config()).await.unwrap();
        assert_eq!(outcome.data(), Some(&vec![1]));
        settle().await;
        assert_eq!(cache.peek(&key()).unwrap().into_value(), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_data_seeds_fresh_entry() {
        let cache = QueryCache::with_defaults();
        let fetcher: Arc<MockFetcher<Vec<u32>>> = Arc::new(MockFetcher::new());

        cache.set_data(&key(), vec![9], &config());
        let outcome = cache.get(&key(), fetcher.clone(), &config()).await.unwrap();

        assert!(outcome.read().unwrap().was_cache_hit());
        assert_eq!(outcome.into_data(), Some(vec![9]));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_refused_while_observed() {
        let cache = QueryCache::with_defaults();
        cache.set_data(&key(), vec![1u32], &config());

        let observer = cache.observe(&key());
        assert!(!cache.remove(&key()));
        drop(observer);
        assert!(cache.remove(&key()));
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_fetch_fails_and_next_read_refetches() {
        let cache = QueryCache::with_defaults();
        let fetcher = Arc::new(MockFetcher::always(Ok(vec![4u32])));
        fetcher.panic_next();

        let err = cache.get(&key(), fetcher.clone(), &config()).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));

        let snapshot = cache.state(&key());
        assert_eq!(snapshot.status, EntryStatus::Failed);
        assert!(!snapshot.is_fetching);

        let outcome = cache.get(&key(), fetcher.clone(), &config()).await.unwrap();
        assert_eq!(outcome.into_data(), Some(vec![4]));
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_background_refresh_keeps_data_and_retries() {
        let cache = QueryCache::with_defaults();
        let fetcher = Arc::new(MockFetcher::always(Ok(vec![2u32])));
        cache.set_data(&key(), vec![1], &config());
        tokio::time::advance(Duration::from_secs(61)).await;

        fetcher.panic_next();
        let stale = cache.get(&key(), fetcher.clone(), &config()).await.unwrap();
        assert_eq!(stale.data(), Some(&vec![1]));
        settle().await;

        let snapshot = cache.state(&key());
        assert_eq!(snapshot.status, EntryStatus::Stale);
        assert!(!snapshot.is_fetching);
        assert_eq!(snapshot.failures, 1);

        let read = cache.refresh(&key(), fetcher.clone(), &config()).await.unwrap();
        assert_eq!(read.into_value(), vec![2]);
        assert_eq!(cache.state(&key()).status, EntryStatus::Fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_is_collectable_after_panicking_fetch() {
        let cache: QueryCache<Vec<u32>> = QueryCache::with_defaults();
        let fetcher = Arc::new(MockFetcher::always(Ok(vec![1u32])));
        fetcher.panic_next();

        assert!(cache.get(&key(), fetcher.clone(), &config()).await.is_err());
        tokio::time::advance(Duration::from_secs(300)).await;

        assert_eq!(cache.collect_garbage(), 1);
        assert!(!cache.contains(&key()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_during_refresh_keeps_entry_stale() {
        let cache = QueryCache::with_defaults();
        let (fetcher, gate) = MockFetcher::gated();
        fetcher.set_fallback(Ok(vec![2u32]));
        let fetcher = Arc::new(fetcher);

        cache.set_data(&key(), vec![1], &config());
        assert!(cache.invalidate(&key()));
        cache.get(&key(), fetcher.clone(), &config()).await.unwrap();
        settle().await;
        assert!(cache.state(&key()).is_fetching);

        assert!(cache.invalidate(&key()));
        gate.open(1);
        settle().await;

        assert_eq!(cache.peek(&key()).unwrap().into_value(), vec![2]);
        assert_eq!(cache.state(&key()).status, EntryStatus::Stale);

        gate.open(1);
        cache.get(&key(), fetcher.clone(), &config()).await.unwrap();
        settle().await;
        assert_eq!(cache.state(&key()).status, EntryStatus::Fresh);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_background_failures_log_warnings() {
        let warnings = Arc::new(AtomicUsize::new(0));
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::registry().with(WarnCounter(Arc::clone(&warnings))),
        );

        let cache = QueryCache::with_defaults();
        let fetcher = Arc::new(MockFetcher::always(Err(FetchError::request_failed(
            500,
            "Internal Server Error",
        ))));
        cache.set_data(&key(), vec![1u32], &config());

        assert!(cache.refresh(&key(), fetcher.clone(), &config()).await.is_err());
        assert_eq!(warnings.load(Ordering::SeqCst), 0);

        assert!(cache.invalidate(&key()));
        cache.get(&key(), fetcher.clone(), &config()).await.unwrap();
        settle().await;
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(warnings.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_evictions_counted_per_entry() {
        let cache = QueryCache::with_defaults();
        cache.set_data(&QueryKey::from_static("a"), 1u32, &config());
        cache.set_data(&QueryKey::from_static("b"), 2u32, &config());
        cache.set_data(&QueryKey::from_static("c"), 3u32, &config());
        let _pinned = cache.observe(&QueryKey::from_static("c"));

        tokio::time::advance(Duration::from_secs(300)).await;
        assert_eq!(cache.collect_garbage(), 2);

        let stats = cache.stats();
        assert_eq!(stats.evictions, 2);
        assert_eq!(stats.entry_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_track_reads() {
        let cache = QueryCache::with_defaults();
        let fetcher = Arc::new(MockFetcher::always(Ok(vec![1u32])));

        cache.get(&key(), fetcher.clone(), &config()).await.unwrap();
        cache.get(&key(), fetcher.clone(), &config()).await.unwrap();
        cache.get(&key(), fetcher.clone(), &config()).await.unwrap();

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.fetches, 1);
        assert_eq!(stats.entry_count, 1);
    }
}
