//! Cached access to teacher verification data.
//!
//! [`VerificationDataClient`] binds the verification fetcher to one query
//! key in a shared [`QueryCache`]. Every consumer that holds a client built on
//! the same cache shares the cached list, its refreshes and its in-flight
//! request.

use std::sync::Arc;

use silencio_cache::{EntrySnapshot, QueryCache, QueryObserver, QueryOutcome};
use silencio_core::{FetchResult, QueryConfig, QueryFetcher, QueryKey, VerificationRecord};

use crate::api_client::{RestClient, VerificationFetcher};
use crate::config::ClientConfig;
use crate::error::ClientError;

pub type Records = Vec<VerificationRecord>;

/// Cache holding verification lists.
pub type VerificationCache = QueryCache<Records>;

#[derive(Clone)]
pub struct VerificationDataClient {
    fetcher: Arc<dyn QueryFetcher<Records>>,
    cache: VerificationCache,
    query: QueryConfig,
    key: QueryKey,
}

impl VerificationDataClient {
    pub fn new(
        fetcher: Arc<dyn QueryFetcher<Records>>,
        cache: VerificationCache,
        query: QueryConfig,
    ) -> Self {
        Self {
            fetcher,
            cache,
            query,
            key: QueryKey::teacher_verification(),
        }
    }

    /// Build an HTTP-backed client on `cache` from file configuration.
    pub fn from_config(config: &ClientConfig, cache: VerificationCache) -> Result<Self, ClientError> {
        let rest = RestClient::from_config(config)?;
        let fetcher = Arc::new(VerificationFetcher::new(rest));
        Ok(Self::new(fetcher, cache, config.query.clone()))
    }

    /// Read the verification list.
    ///
    /// `enabled` gates the read together with the configured `enabled` flag:
    /// when either is false nothing is fetched and the cache is left
    /// untouched. Otherwise this follows [`QueryCache::get`]: fresh data is
    /// served from the cache, stale data is served while it refreshes in the
    /// background, and with nothing cached the caller waits on the one shared
    /// request.
    pub async fn get_verification_data(&self, enabled: bool) -> FetchResult<QueryOutcome<Records>> {
        let query = self.query.clone().with_enabled(self.query.enabled && enabled);
        self.cache
            .get(&self.key, Arc::clone(&self.fetcher), &query)
            .await
    }

    /// Refetch now and wait for the result, reporting failures even when a
    /// cached list exists. Returns [`QueryOutcome::Inactive`] without fetching
    /// when the configured `enabled` flag is false.
    pub async fn refresh(&self) -> FetchResult<QueryOutcome<Records>> {
        if !self.query.enabled {
            tracing::trace!(key = %self.key, "Query disabled, skipping refresh");
            return Ok(QueryOutcome::Inactive);
        }
        let read = self
            .cache
            .refresh(&self.key, Arc::clone(&self.fetcher), &self.query)
            .await?;
        Ok(QueryOutcome::Ready(read))
    }

    /// Keep the cached list alive while the returned handle exists.
    pub fn observe(&self) -> QueryObserver<Records> {
        self.cache.observe(&self.key)
    }

    pub fn state(&self) -> EntrySnapshot {
        self.cache.state(&self.key)
    }

    /// Mark the cached list stale; the next enabled read refreshes it.
    pub fn invalidate(&self) -> bool {
        self.cache.invalidate(&self.key)
    }

    pub fn cache(&self) -> &VerificationCache {
        &self.cache
    }

    pub fn query_config(&self) -> &QueryConfig {
        &self.query
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}
