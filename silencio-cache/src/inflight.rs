//! In-flight fetch registration.
//!
//! Each entry holds at most one [`InFlight`]. Readers that arrive while it is
//! pending clone the shared handle and all resolve to the same result.

use std::future::Future;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use silencio_core::FetchResult;
use tokio::time::Instant;

pub(crate) type SharedFetch<T> = Shared<BoxFuture<'static, FetchResult<T>>>;

pub(crate) struct InFlight<T> {
    fetch: SharedFetch<T>,
    started_at: Instant,
    /// Entry invalidation generation when the fetch started.
    generation: u64,
}

impl<T> InFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Start driving `fetch` on the runtime.
    ///
    /// The spawned driver owns a clone of the shared future, so the fetch and
    /// its commit run to completion even if every waiter is dropped.
    pub fn launch<F>(fetch: F, generation: u64) -> Self
    where
        F: Future<Output = FetchResult<T>> + Send + 'static,
    {
        let fetch = fetch.boxed().shared();
        tokio::spawn(fetch.clone());
        Self {
            fetch,
            started_at: Instant::now(),
            generation,
        }
    }
}

impl<T> InFlight<T> {
    pub fn join(&self) -> SharedFetch<T> {
        self.fetch.clone()
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
