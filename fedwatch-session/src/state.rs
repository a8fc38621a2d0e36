//! Shared session state and its subscriber list.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use fedwatch_types::SessionState;

/// A subscriber callback.
pub(crate) type Callback = Arc<dyn Fn(&SessionState) + Send + Sync>;

/// Current session plus the callbacks to notify when it changes.
#[derive(Default)]
pub(crate) struct SessionRegistry {
    state: RwLock<SessionState>,
    subscribers: RwLock<BTreeMap<u64, Callback>>,
    next_id: AtomicU64,
    /// Serializes commits so notifications arrive in commit order.
    commit: Mutex<()>,
}

impl SessionRegistry {
    pub fn current(&self) -> SessionState {
        self.state.read().clone()
    }

    /// Register a callback and return its id.
    pub fn subscribe(&self, callback: Callback) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().insert(id, callback);
        id
    }

    /// Remove a callback. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: u64) -> bool {
        self.subscribers.write().remove(&id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Replace the state and notify every subscriber.
    ///
    /// A value equal to the current state notifies nobody and returns
    /// `false`. Callbacks run with no registry lock other than the commit
    /// lock held, so they may subscribe or unsubscribe.
    pub fn commit(&self, next: SessionState) -> bool {
        let _serial = self.commit.lock();
        {
            let mut state = self.state.write();
            if *state == next {
                return false;
            }
            *state = next.clone();
        }

        let subscribers: Vec<Callback> = self.subscribers.read().values().cloned().collect();
        for callback in subscribers {
            callback(&next);
        }
        true
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("state", &*self.state.read())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
