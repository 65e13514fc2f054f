//! Freshness metadata for query reads.
//!
//! Reads never hand back a bare value: callers get a [`CacheRead<T>`] that
//! says whether the data came from the cache and whether it is stale, so a
//! consumer showing stale data can say so.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Lifecycle state of a single cache entry.
///
/// An evicted entry has no state of its own; it reports [`EntryStatus::Idle`]
/// until it is read again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    /// Never fetched.
    Idle,
    /// First fetch in flight, nothing to serve yet.
    Loading,
    /// Data cached and inside its stale window.
    Fresh,
    /// Data cached but past its stale window or explicitly invalidated.
    Stale,
    /// Last fetch failed and there is no data to serve.
    Failed,
}

impl EntryStatus {
    /// True when the entry has data to serve.
    pub fn has_data(self) -> bool {
        matches!(self, Self::Fresh | Self::Stale)
    }
}

/// Result of a query read, carrying freshness metadata.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    value: T,
    /// When the value was produced by a successful fetch.
    updated_at: DateTime<Utc>,
    was_cache_hit: bool,
    is_stale: bool,
}

impl<T> CacheRead<T> {
    /// A value served from the cache.
    pub fn from_cache(value: T, updated_at: DateTime<Utc>, is_stale: bool) -> Self {
        Self {
            value,
            updated_at,
            was_cache_hit: true,
            is_stale,
        }
    }

    /// A value the caller waited on a fetch for.
    pub fn from_fetch(value: T, updated_at: DateTime<Utc>) -> Self {
        Self {
            value,
            updated_at,
            was_cache_hit: false,
            is_stale: false,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Time elapsed since the value was fetched.
    pub fn age(&self) -> Duration {
        Utc::now()
            .signed_duration_since(self.updated_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    pub fn was_cache_hit(&self) -> bool {
        self.was_cache_hit
    }

    pub fn was_cache_miss(&self) -> bool {
        !self.was_cache_hit
    }

    /// True when the value was served past its stale window. A background
    /// refresh has been scheduled unless one was already running or backing
    /// off.
    pub fn is_stale(&self) -> bool {
        self.is_stale
    }

    pub fn map<U, F>(self, f: F) -> CacheRead<U>
    where
        F: FnOnce(T) -> U,
    {
        CacheRead {
            value: f(self.value),
            updated_at: self.updated_at,
            was_cache_hit: self.was_cache_hit,
            is_stale: self.is_stale,
        }
    }
}

impl<T> AsRef<T> for CacheRead<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

/// Outcome of a conditional query read.
#[derive(Debug, Clone)]
pub enum QueryOutcome<T> {
    /// The query is disabled; nothing was fetched or cached.
    Inactive,
    /// Data is available.
    Ready(CacheRead<T>),
}

impl<T> QueryOutcome<T> {
    pub fn is_inactive(&self) -> bool {
        matches!(self, Self::Inactive)
    }

    pub fn read(&self) -> Option<&CacheRead<T>> {
        match self {
            Self::Ready(read) => Some(read),
            Self::Inactive => None,
        }
    }

    pub fn data(&self) -> Option<&T> {
        self.read().map(CacheRead::value)
    }

    pub fn into_read(self) -> Option<CacheRead<T>> {
        match self {
            Self::Ready(read) => Some(read),
            Self::Inactive => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        self.into_read().map(CacheRead::into_value)
    }
}
