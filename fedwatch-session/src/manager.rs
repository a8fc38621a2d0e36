//! Session lifecycle on top of an [`IdentityProvider`].

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use fedwatch_types::{Error, Result, Session, SessionState};

use crate::provider::IdentityProvider;
use crate::state::SessionRegistry;
use crate::subscription::Subscription;
use crate::validation::SignUpRequest;

/// Owns the current [`SessionState`] and the identity operations that change it.
///
/// Construct one manager at startup and hand clones to every consumer;
/// clones share the same state and subscribers. The state starts as
/// [`SessionState::Unresolved`] until [`listen`](SessionManager::listen) or
/// an operation resolves it.
///
/// Failed operations leave the state as it was.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use fedwatch_session::{MemoryIdentityProvider, SessionManager};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> fedwatch_types::Result<()> {
/// let provider = Arc::new(MemoryIdentityProvider::new());
/// provider.add_account("doc@hospital.org", "secret1");
///
/// let manager = SessionManager::new(provider);
/// let _subscription = manager.subscribe(|state| println!("session changed: {:?}", state));
///
/// let session = manager.authenticate("doc@hospital.org", "secret1").await?;
/// assert_eq!(session.email, "doc@hospital.org");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    registry: Arc<SessionRegistry>,
}

impl SessionManager {
    /// Create a manager over `provider`.
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            registry: Arc::new(SessionRegistry::default()),
        }
    }

    /// The current state.
    pub fn current(&self) -> SessionState {
        self.registry.current()
    }

    /// The signed-in session, if any.
    pub fn session(&self) -> Option<Session> {
        self.current().session().cloned()
    }

    /// Call `callback` on every state transition until the returned guard
    /// is dropped.
    ///
    /// Callbacks run synchronously inside the commit and must not block.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        let id = self.registry.subscribe(Arc::new(callback));
        Subscription::new(id, Arc::downgrade(&self.registry))
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.registry.subscriber_count()
    }

    /// Create an account and sign it in, then set its display name if one
    /// is given.
    ///
    /// Password rules are the caller's to check first; see
    /// [`sign_up`](SessionManager::sign_up). If the profile update fails the
    /// account still exists and stays signed in, and the update error is
    /// returned.
    pub async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Session> {
        let session = self
            .provider
            .create_account(email, password)
            .await
            .inspect_err(|err| warn!(email, error = %err, "account creation failed"))?;
        self.commit(SessionState::SignedIn(session.clone()));

        let Some(name) = display_name else {
            return Ok(session);
        };
        let updated = self
            .provider
            .update_profile(name)
            .await
            .inspect_err(|err| warn!(email, error = %err, "profile update failed"))?;
        self.commit(SessionState::SignedIn(updated.clone()));
        Ok(updated)
    }

    /// Validate `request` locally, then create the account.
    ///
    /// A request that fails validation never reaches the provider.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<Session> {
        request.validate()?;
        self.create_account(&request.email, &request.password, request.display_name())
            .await
    }

    /// Sign in with email and password.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Session> {
        let session = self
            .provider
            .sign_in(email, password)
            .await
            .inspect_err(|err| warn!(email, error = %err, "sign-in failed"))?;
        self.commit(SessionState::SignedIn(session.clone()));
        Ok(session)
    }

    /// Sign out.
    pub async fn deauthenticate(&self) -> Result<()> {
        self.provider
            .sign_out()
            .await
            .inspect_err(|err| warn!(error = %err, "sign-out failed"))?;
        self.commit(SessionState::SignedOut);
        Ok(())
    }

    /// Ask the provider to send a password-reset message.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        self.provider
            .send_password_reset(email)
            .await
            .inspect_err(|err| warn!(email, error = %err, "password reset request failed"))?;
        debug!(email, "password reset requested");
        Ok(())
    }

    /// Change the display name of the signed-in user.
    pub async fn update_display_name(&self, name: &str) -> Result<Session> {
        if !self.current().is_signed_in() {
            return Err(Error::validation("No user is signed in"));
        }
        let updated = self
            .provider
            .update_profile(name)
            .await
            .inspect_err(|err| warn!(error = %err, "profile update failed"))?;
        self.commit(SessionState::SignedIn(updated.clone()));
        Ok(updated)
    }

    /// Resolve the state from the provider and follow its session changes.
    ///
    /// The state is resolved immediately from the provider's current
    /// session. The returned handle stops the listener; dropping it does
    /// the same.
    pub fn listen(&self) -> ListenerHandle {
        let changes = self.provider.session_changes();
        self.commit(SessionState::resolved(self.provider.current_session()));

        let (stop_tx, stop_rx) = watch::channel(false);
        let manager = self.clone();
        let task = tokio::spawn(listen_worker(manager, changes, stop_rx));

        ListenerHandle { stop_tx, task }
    }

    fn commit(&self, next: SessionState) -> bool {
        let changed = self.registry.commit(next.clone());
        if changed {
            match &next {
                SessionState::SignedIn(session) => {
                    info!(user = %session.email, "session signed in")
                }
                SessionState::SignedOut => info!("session signed out"),
                SessionState::Unresolved => debug!("session unresolved"),
            }
        }
        changed
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.registry.current())
            .field("subscribers", &self.registry.subscriber_count())
            .finish()
    }
}

async fn listen_worker(
    manager: SessionManager,
    mut changes: broadcast::Receiver<Option<Session>>,
    mut stop_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            result = stop_rx.changed() => {
                if result.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            change = changes.recv() => match change {
                Ok(session) => {
                    manager.commit(SessionState::resolved(session));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "session listener lagged, resyncing");
                    manager.commit(SessionState::resolved(manager.provider.current_session()));
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
    debug!("session listener stopped");
}

/// Handle to a running session listener.
///
/// Drop this handle to stop listening, or call `stop()` explicitly.
pub struct ListenerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    /// Whether the listener task is still running.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop listening and wait for the task to finish.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.task.await;
    }
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use fedwatch_types::ErrorKind;
    use parking_lot::Mutex;

    use super::*;
    use crate::memory::MemoryIdentityProvider;

    fn setup() -> (Arc<MemoryIdentityProvider>, SessionManager) {
        let provider = Arc::new(MemoryIdentityProvider::new());
        provider.add_account("doc@hospital.org", "secret1");
        let manager = SessionManager::new(provider.clone());
        (provider, manager)
    }

    fn record(manager: &SessionManager) -> (Arc<Mutex<Vec<SessionState>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let subscription = manager.subscribe(move |state| sink.lock().push(state.clone()));
        (seen, subscription)
    }

    #[tokio::test]
    async fn test_starts_unresolved() {
        let (_, manager) = setup();
        assert_eq!(manager.current(), SessionState::Unresolved);
        assert!(manager.session().is_none());
    }

    #[tokio::test]
    async fn test_authenticate_notifies_each_subscriber_once() {
        let (_, manager) = setup();
        let (first, _first_guard) = record(&manager);
        let (second, _second_guard) = record(&manager);

        let session = manager.authenticate("doc@hospital.org", "secret1").await.unwrap();
        assert_eq!(session.email, "doc@hospital.org");

        for seen in [first, second] {
            let seen = seen.lock();
            assert_eq!(seen.len(), 1);
            assert_eq!(
                seen[0].session().map(|s| s.email.as_str()),
                Some("doc@hospital.org")
            );
        }
    }

    #[tokio::test]
    async fn test_authenticate_twice_is_one_transition() {
        let (_, manager) = setup();
        let (seen, _guard) = record(&manager);

        manager.authenticate("doc@hospital.org", "secret1").await.unwrap();
        manager.authenticate("doc@hospital.org", "secret1").await.unwrap();

        assert_eq!(seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_sign_in_keeps_state() {
        let (_, manager) = setup();
        manager.authenticate("doc@hospital.org", "secret1").await.unwrap();
        let before = manager.current();
        let (seen, _guard) = record(&manager);

        let err = manager
            .authenticate("doc@hospital.org", "wrongpass")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(err.message(), "INVALID_LOGIN_CREDENTIALS");
        assert_eq!(manager.current(), before);
        assert!(seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_deauthenticate() {
        let (provider, manager) = setup();
        manager.authenticate("doc@hospital.org", "secret1").await.unwrap();
        let (seen, _guard) = record(&manager);

        manager.deauthenticate().await.unwrap();

        assert_eq!(manager.current(), SessionState::SignedOut);
        assert_eq!(*seen.lock(), vec![SessionState::SignedOut]);
        assert!(provider.current_session().is_none());
    }

    #[tokio::test]
    async fn test_create_account_with_display_name() {
        let (_, manager) = setup();
        let (seen, _guard) = record(&manager);

        let session = manager
            .create_account("nurse@hospital.org", "secret2", Some("Nurse Joy"))
            .await
            .unwrap();

        assert_eq!(session.display_name.as_deref(), Some("Nurse Joy"));
        assert_eq!(manager.session(), Some(session));
        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].session().and_then(|s| s.display_name.clone()), None);
    }

    #[tokio::test]
    async fn test_create_account_duplicate() {
        let (_, manager) = setup();
        let err = manager
            .create_account("doc@hospital.org", "secret1", None)
            .await
            .unwrap_err();
        assert_eq!(err, Error::auth("EMAIL_EXISTS"));
        assert_eq!(manager.current(), SessionState::Unresolved);
    }

    #[tokio::test]
    async fn test_sign_up_validates_before_provider_call() {
        let (provider, manager) = setup();
        let invalid = [
            SignUpRequest::new("new@hospital.org", "12345"),
            SignUpRequest::new("new@hospital.org", "secret1").with_confirmation("secret2"),
            SignUpRequest::new("new@hospital.org", ""),
        ];

        for request in invalid {
            let err = manager.sign_up(&request).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
        assert_eq!(provider.calls(), 0);
        assert_eq!(provider.account_count(), 1);
    }

    #[tokio::test]
    async fn test_sign_up() {
        let (provider, manager) = setup();
        let request =
            SignUpRequest::new("new@hospital.org", "secret1").with_display_name("Dr. New");
        let session = manager.sign_up(&request).await.unwrap();
        assert_eq!(session.label(), "Dr. New");
        assert_eq!(provider.account_count(), 2);
    }

    #[tokio::test]
    async fn test_password_reset() {
        let (provider, manager) = setup();
        manager.request_password_reset("doc@hospital.org").await.unwrap();
        assert_eq!(provider.reset_requests(), vec!["doc@hospital.org".to_string()]);

        let err = manager
            .request_password_reset("ghost@hospital.org")
            .await
            .unwrap_err();
        assert_eq!(err.message(), "EMAIL_NOT_FOUND");
        assert_eq!(manager.current(), SessionState::Unresolved);
    }

    #[tokio::test]
    async fn test_update_display_name_requires_session() {
        let (provider, manager) = setup();
        let err = manager.update_display_name("Dr. Ada").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(provider.calls(), 0);

        manager.authenticate("doc@hospital.org", "secret1").await.unwrap();
        let updated = manager.update_display_name("Dr. Ada").await.unwrap();
        assert_eq!(updated.label(), "Dr. Ada");
        assert_eq!(manager.session(), Some(updated));
    }

    #[tokio::test]
    async fn test_dropped_subscription_stops_notifications() {
        let (_, manager) = setup();
        let (seen, guard) = record(&manager);
        assert_eq!(manager.subscriber_count(), 1);

        drop(guard);
        assert_eq!(manager.subscriber_count(), 0);
        manager.authenticate("doc@hospital.org", "secret1").await.unwrap();
        assert!(seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let (_, manager) = setup();
        let other = manager.clone();
        let (seen, _guard) = record(&other);

        manager.authenticate("doc@hospital.org", "secret1").await.unwrap();

        assert!(other.current().is_signed_in());
        assert_eq!(seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_listen_resolves_signed_out() {
        let (_, manager) = setup();
        let (seen, _guard) = record(&manager);

        let listener = manager.listen();
        assert_eq!(manager.current(), SessionState::SignedOut);
        assert_eq!(*seen.lock(), vec![SessionState::SignedOut]);
        listener.stop().await;
    }

    #[tokio::test]
    async fn test_listen_follows_provider_changes() {
        let (provider, manager) = setup();
        let listener = manager.listen();
        let mut states = watch_states(&manager);

        assert!(provider.restore("doc@hospital.org"));
        let state = next_state(&mut states).await;
        assert_eq!(
            state.session().map(|s| s.email.as_str()),
            Some("doc@hospital.org")
        );

        provider.revoke();
        assert_eq!(next_state(&mut states).await, SessionState::SignedOut);

        listener.stop().await;
    }

    #[tokio::test]
    async fn test_stopped_listener_ignores_provider() {
        let (provider, manager) = setup();
        let listener = manager.listen();
        assert!(listener.is_running());
        listener.stop().await;

        provider.restore("doc@hospital.org");
        tokio::task::yield_now().await;
        assert_eq!(manager.current(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn test_dropped_listener_stops() {
        let (provider, manager) = setup();
        let listener = manager.listen();
        drop(listener);

        // Let the worker observe the closed stop channel.
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        provider.restore("doc@hospital.org");
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert_eq!(manager.current(), SessionState::SignedOut);
    }

    /// Forward committed states into a channel the test can await.
    fn watch_states(
        manager: &SessionManager,
    ) -> (tokio::sync::mpsc::UnboundedReceiver<SessionState>, Subscription) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let subscription = manager.subscribe(move |state| {
            let _ = tx.send(state.clone());
        });
        (rx, subscription)
    }

    async fn next_state(
        states: &mut (tokio::sync::mpsc::UnboundedReceiver<SessionState>, Subscription),
    ) -> SessionState {
        tokio::time::timeout(std::time::Duration::from_secs(5), states.0.recv())
            .await
            .unwrap()
            .unwrap()
    }
}
