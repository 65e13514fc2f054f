//! silencio Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - A scripted [`MockFetcher`] with call counting and an optional gate
//! - Verification record fixtures
//! - Proptest generators for records

pub use silencio_core::{FetchError, FetchResult, QueryFetcher, QueryKey, VerificationRecord};

use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;

// ============================================================================
// MOCK FETCHER
// ============================================================================

/// Fetcher that replays scripted results.
///
/// Queued results are returned in order; once the queue is empty the
/// fallback is returned for every further call. With a [`FetchGate`], each
/// call parks until the test opens the gate, which lets a test pile up
/// concurrent readers before any response exists.
pub struct MockFetcher<T> {
    queue: Mutex<VecDeque<FetchResult<T>>>,
    fallback: Mutex<Option<FetchResult<T>>>,
    calls: AtomicUsize,
    /// Calls still scripted to panic before answering.
    panics: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl<T: Clone> MockFetcher<T> {
    /// Fetcher with an empty script. Unscripted calls fail with a transport error.
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(None),
            calls: AtomicUsize::new(0),
            panics: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// Fetcher that returns `result` on every call.
    pub fn always(result: FetchResult<T>) -> Self {
        let fetcher = Self::new();
        fetcher.set_fallback(result);
        fetcher
    }

    /// Fetcher whose calls wait on the returned gate.
    pub fn gated() -> (Self, FetchGate) {
        let semaphore = Arc::new(Semaphore::new(0));
        let fetcher = Self {
            gate: Some(Arc::clone(&semaphore)),
            ..Self::new()
        };
        (fetcher, FetchGate(semaphore))
    }

    /// Queue a result for the next unanswered call.
    pub fn push(&self, result: FetchResult<T>) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(result);
    }

    /// Make the next call panic instead of answering. Queued results are
    /// left for the calls after it.
    pub fn panic_next(&self) {
        self.panics.fetch_add(1, Ordering::SeqCst);
    }

    pub fn set_fallback(&self, result: FetchResult<T>) {
        *self.fallback.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
    }

    /// Number of fetches that have started.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_result(&self) -> FetchResult<T> {
        let queued = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        queued
            .or_else(|| {
                self.fallback
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone()
            })
            .unwrap_or_else(|| Err(FetchError::transport("no scripted response")))
    }
}

impl<T: Clone> Default for MockFetcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> QueryFetcher<T> for MockFetcher<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn fetch(&self, _key: &QueryKey) -> FetchResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            match gate.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_) => return Err(FetchError::transport("fetch gate closed")),
            }
        }
        let panicking = self
            .panics
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if panicking {
            panic!("scripted fetcher panic");
        }
        self.next_result()
    }
}

/// Releases parked [`MockFetcher`] calls.
#[derive(Clone)]
pub struct FetchGate(Arc<Semaphore>);

impl FetchGate {
    /// Let `calls` parked or future fetches proceed.
    pub fn open(&self, calls: usize) {
        self.0.add_permits(calls);
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// A record with the two fields the verification API always sends.
pub fn record(id: &str, status: &str) -> VerificationRecord {
    VerificationRecord::new(json!({ "id": id, "status": status }))
}

/// Two records covering the verified and pending states.
pub fn sample_records() -> Vec<VerificationRecord> {
    vec![record("t1", "verified"), record("t2", "pending")]
}

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    use super::*;
    use proptest::prelude::*;

    pub fn arb_status() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("verified".to_string()),
            Just("pending".to_string()),
            Just("rejected".to_string()),
        ]
    }

    /// Records with an id, a status, and an optional free-form note.
    pub fn arb_verification_record() -> impl Strategy<Value = VerificationRecord> {
        ("[a-z][a-z0-9]{0,11}", arb_status(), proptest::option::of(".{0,32}")).prop_map(
            |(id, status, note)| {
                let mut value = json!({ "id": id, "status": status });
                if let (Some(note), Some(object)) = (note, value.as_object_mut()) {
                    object.insert("note".to_string(), json!(note));
                }
                VerificationRecord::new(value)
            },
        )
    }

    pub fn arb_records() -> impl Strategy<Value = Vec<VerificationRecord>> {
        proptest::collection::vec(arb_verification_record(), 0..16)
    }
}
