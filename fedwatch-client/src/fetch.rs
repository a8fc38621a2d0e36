//! A re-fetchable value with stale-result protection.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use fedwatch_types::{FetchState, Result};

/// Holds the [`FetchState`] of one resource and commits only the result
/// of the most recently started fetch.
///
/// Every call to [`FetchCell::run`] takes a new sequence number. When a
/// fetch finishes it commits only if no newer fetch has started since, so
/// a slow earlier call can never overwrite the outcome of a later one.
#[derive(Debug)]
pub struct FetchCell<T> {
    state: watch::Sender<FetchState<T>>,
    sequence: AtomicU64,
}

impl<T: Clone> FetchCell<T> {
    /// An idle cell.
    pub fn new() -> Self {
        let (state, _) = watch::channel(FetchState::idle());
        Self {
            state,
            sequence: AtomicU64::new(0),
        }
    }

    /// The current state.
    pub fn state(&self) -> FetchState<T> {
        self.state.borrow().clone()
    }

    /// A receiver notified on every committed state.
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.state.subscribe()
    }

    /// Sequence number of the most recently started fetch.
    pub fn latest(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Run `fetch`, tracking it in the state.
    ///
    /// The result is always returned to the caller; it is only committed
    /// to the state if this is still the latest fetch.
    pub async fn run<F>(&self, fetch: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let id = self.begin();
        let result = fetch.await;
        self.finish(id, &result);
        result
    }

    fn begin(&self) -> u64 {
        let mut id = 0;
        self.state.send_modify(|state| {
            id = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
            state.begin();
        });
        id
    }

    fn finish(&self, id: u64, result: &Result<T>) -> bool {
        self.state.send_if_modified(|state| {
            if self.sequence.load(Ordering::SeqCst) != id {
                return false;
            }
            *state = FetchState::from_result(result.clone());
            true
        })
    }
}

impl<T: Clone> Default for FetchCell<T> {
    fn default() -> Self {
        Self::new()
    }
}
