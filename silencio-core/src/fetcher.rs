//! Fetcher seam between the query cache and whatever produces the data.

use async_trait::async_trait;

use crate::entities::QueryKey;
use crate::error::FetchResult;

/// Produces the value for a query key.
///
/// The cache calls this at most once per coalesced request. Implementations
/// live outside the cache (HTTP in `silencio-client`, scripted mocks in tests).
#[async_trait]
pub trait QueryFetcher<T>: Send + Sync {
    async fn fetch(&self, key: &QueryKey) -> FetchResult<T>;
}
