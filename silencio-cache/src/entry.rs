//! A single cache entry and its state transitions.

use std::time::Duration;

use chrono::{DateTime, Utc};
use silencio_core::{BackoffConfig, FetchError, FetchResult, QueryConfig};
use tokio::time::Instant;

use crate::freshness::{CacheRead, EntryStatus};
use crate::inflight::InFlight;

/// Data produced by the last successful fetch.
pub(crate) struct CachedData<T> {
    pub value: T,
    /// Monotonic fetch time, used for the stale window.
    pub fetched_at: Instant,
    /// Wall-clock fetch time, reported to readers.
    pub updated_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
            updated_at: Utc::now(),
        }
    }
}

pub(crate) struct Entry<T> {
    pub data: Option<CachedData<T>>,
    pub in_flight: Option<InFlight<T>>,
    pub last_error: Option<FetchError>,
    /// Consecutive failed fetches since the last success.
    pub failures: u32,
    /// Set by `invalidate`; cleared by a successful fetch started after it.
    pub invalidated: bool,
    /// Bumped on every invalidation.
    pub generation: u64,
    /// Earliest instant another background refresh may start.
    pub retry_after: Option<Instant>,
    pub last_access: Instant,
    pub stale_window: Duration,
    pub gc_window: Duration,
}

impl<T: Clone> Entry<T> {
    pub fn new(now: Instant, config: &QueryConfig) -> Self {
        Self {
            data: None,
            in_flight: None,
            last_error: None,
            failures: 0,
            invalidated: false,
            generation: 0,
            retry_after: None,
            last_access: now,
            stale_window: config.stale_window,
            gc_window: config.gc_window,
        }
    }

    /// Record a read. The most recent reader's windows win.
    pub fn touch(&mut self, now: Instant, config: &QueryConfig) {
        self.last_access = now;
        self.stale_window = config.stale_window;
        self.gc_window = config.gc_window;
    }

    pub fn is_stale(&self, now: Instant) -> bool {
        match &self.data {
            Some(data) => {
                self.invalidated || now.saturating_duration_since(data.fetched_at) >= self.stale_window
            }
            None => false,
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether a background refresh may start now.
    pub fn may_refresh(&self, now: Instant) -> bool {
        !self.is_fetching() && self.retry_after.map_or(true, |at| now >= at)
    }

    pub fn status(&self, now: Instant) -> EntryStatus {
        if self.data.is_some() {
            if self.is_stale(now) {
                EntryStatus::Stale
            } else {
                EntryStatus::Fresh
            }
        } else if self.is_fetching() {
            EntryStatus::Loading
        } else if self.last_error.is_some() {
            EntryStatus::Failed
        } else {
            EntryStatus::Idle
        }
    }

    /// Eligible for eviction: unobserved, idle and unused for the GC window.
    pub fn is_collectable(&self, now: Instant, observers: usize) -> bool {
        observers == 0
            && !self.is_fetching()
            && now.saturating_duration_since(self.last_access) >= self.gc_window
    }

    pub fn read(&self, now: Instant) -> Option<CacheRead<T>> {
        let stale = self.is_stale(now);
        self.data
            .as_ref()
            .map(|data| CacheRead::from_cache(data.value.clone(), data.updated_at, stale))
    }

    /// Mark the data stale. Returns false when there is no data.
    pub fn invalidate(&mut self) -> bool {
        if self.data.is_none() {
            return false;
        }
        self.invalidated = true;
        self.generation = self.generation.wrapping_add(1);
        self.retry_after = None;
        true
    }

    pub fn store(&mut self, value: T) {
        self.data = Some(CachedData::new(value));
        self.last_error = None;
        self.failures = 0;
        self.invalidated = false;
        self.retry_after = None;
    }

    /// Apply the outcome of a finished fetch.
    ///
    /// Success replaces the data; an invalidation that arrived while the
    /// fetch was running keeps the new data stale. Failure records the error
    /// and, when data is still being served, pushes back the next background
    /// refresh.
    pub fn commit(&mut self, result: &FetchResult<T>, backoff: &BackoffConfig) {
        let started_generation = self.in_flight.take().map(|fetch| fetch.generation());
        match result {
            Ok(value) => {
                self.store(value.clone());
                if started_generation.is_some_and(|generation| generation != self.generation) {
                    self.invalidated = true;
                }
            }
            Err(err) => {
                self.failures = self.failures.saturating_add(1);
                self.last_error = Some(err.clone());
                if self.data.is_some() {
                    self.retry_after = Some(Instant::now() + backoff.delay(self.failures));
                }
            }
        }
    }

    pub fn snapshot(&self, now: Instant, observers: usize) -> EntrySnapshot {
        EntrySnapshot {
            status: self.status(now),
            updated_at: self.data.as_ref().map(|data| data.updated_at),
            error: self.last_error.clone(),
            failures: self.failures,
            observers,
            is_fetching: self.is_fetching(),
            fetch_started_at: self.in_flight.as_ref().map(InFlight::started_at),
        }
    }
}

/// Diagnostic view of an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySnapshot {
    pub status: EntryStatus,
    /// When the cached data was fetched, if there is any.
    pub updated_at: Option<DateTime<Utc>>,
    /// Error from the most recent failed fetch since the last success.
    pub error: Option<FetchError>,
    pub failures: u32,
    pub observers: usize,
    pub is_fetching: bool,
    pub fetch_started_at: Option<Instant>,
}

impl EntrySnapshot {
    /// Snapshot for a key with no entry.
    pub fn idle(observers: usize) -> Self {
        Self {
            status: EntryStatus::Idle,
            updated_at: None,
            error: None,
            failures: 0,
            observers,
            is_fetching: false,
            fetch_started_at: None,
        }
    }
}
