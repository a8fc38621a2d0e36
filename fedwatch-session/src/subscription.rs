//! RAII guard for session subscriptions.

use std::sync::Weak;

use crate::state::SessionRegistry;

/// Keeps a session callback registered.
///
/// Dropping the guard removes the callback. Hold it for as long as the
/// consumer wants notifications.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use fedwatch_session::{MemoryIdentityProvider, SessionManager};
///
/// let manager = SessionManager::new(Arc::new(MemoryIdentityProvider::new()));
/// let subscription = manager.subscribe(|state| println!("session: {:?}", state));
/// assert_eq!(manager.subscriber_count(), 1);
///
/// drop(subscription);
/// assert_eq!(manager.subscriber_count(), 0);
/// ```
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<SessionRegistry>,
}

impl Subscription {
    pub(crate) fn new(id: u64, registry: Weak<SessionRegistry>) -> Self {
        Self { id, registry }
    }

    /// Identifier of the registered callback.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the callback now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unsubscribe(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
