//! The identity-provider seam.

use async_trait::async_trait;
use tokio::sync::broadcast;

use fedwatch_types::{Result, Session};

/// Capacity of provider session-change channels.
pub const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// An external identity provider.
///
/// Each operation reports its own outcome through its return value. The
/// [`session_changes`](IdentityProvider::session_changes) stream carries the
/// changes the provider makes on its own, such as a revoked or refreshed
/// session.
///
/// Rejections are reported as [`Error::Auth`](fedwatch_types::Error::Auth)
/// carrying the provider's message.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new account and sign it in.
    async fn create_account(&self, email: &str, password: &str) -> Result<Session>;

    /// Sign in with email and password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// End the current session.
    async fn sign_out(&self) -> Result<()>;

    /// Ask the provider to send a password-reset message to `email`.
    ///
    /// Success means the request was accepted, not that anything was
    /// delivered.
    async fn send_password_reset(&self, email: &str) -> Result<()>;

    /// Set the display name of the signed-in user.
    async fn update_profile(&self, display_name: &str) -> Result<Session>;

    /// The session the provider currently holds, if any.
    fn current_session(&self) -> Option<Session>;

    /// Subscribe to provider-driven session changes.
    fn session_changes(&self) -> broadcast::Receiver<Option<Session>>;
}
