//! Consumer registration.

use std::sync::Arc;

use silencio_core::QueryKey;
use tokio::time::Instant;

use crate::query_cache::Inner;

/// Keeps a query's entry alive while a consumer is mounted.
///
/// Dropping the observer unregisters it and stamps the entry's last access,
/// so the GC window starts counting from when the last consumer went away.
pub struct QueryObserver<T> {
    inner: Arc<Inner<T>>,
    key: QueryKey,
}

impl<T> QueryObserver<T> {
    pub(crate) fn new(inner: Arc<Inner<T>>, key: QueryKey) -> Self {
        *inner.lock().observers.entry(key.clone()).or_insert(0) += 1;
        Self { inner, key }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

impl<T> Drop for QueryObserver<T> {
    fn drop(&mut self) {
        let mut state = self.inner.lock();
        if let Some(count) = state.observers.get_mut(&self.key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                state.observers.remove(&self.key);
            }
        }
        if let Some(entry) = state.entries.get_mut(&self.key) {
            entry.last_access = Instant::now();
        }
    }
}
