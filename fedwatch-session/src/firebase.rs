//! Firebase Identity Toolkit REST provider.
//!
//! Uses the `accounts:*` endpoints of the Identity Toolkit v1 API with an
//! API key. Tokens are held in memory only; sign-out just forgets them.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use fedwatch_types::{Error, Result, Session};

use crate::provider::{IdentityProvider, CHANGE_CHANNEL_CAPACITY};

/// Default Identity Toolkit address.
pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Provider messages that mean the held token is no longer usable.
const TOKEN_REJECTIONS: &[&str] = &[
    "INVALID_ID_TOKEN",
    "TOKEN_EXPIRED",
    "USER_NOT_FOUND",
    "USER_DISABLED",
    "CREDENTIAL_TOO_OLD_LOGIN_AGAIN",
];

#[derive(Debug, Clone)]
struct SignedInUser {
    session: Session,
    id_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OobRequest<'a> {
    request_type: &'static str,
    email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

impl AccountResponse {
    fn session(&self) -> Session {
        Session {
            id: self.local_id.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone().filter(|name| !name.is_empty()),
            is_authenticated: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Identity provider backed by the Firebase Identity Toolkit REST API.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use fedwatch_session::{FirebaseIdentityProvider, SessionManager};
///
/// # async fn run() -> fedwatch_types::Result<()> {
/// let provider = FirebaseIdentityProvider::builder()
///     .api_key("AIza...")
///     .build()?;
/// let manager = SessionManager::new(Arc::new(provider));
/// manager.authenticate("doc@hospital.org", "secret1").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FirebaseIdentityProvider {
    client: Client,
    base_url: String,
    api_key: String,
    current: Mutex<Option<SignedInUser>>,
    changes: broadcast::Sender<Option<Session>>,
}

impl FirebaseIdentityProvider {
    /// Create a new builder for configuring the provider.
    pub fn builder() -> FirebaseIdentityProviderBuilder {
        FirebaseIdentityProviderBuilder::default()
    }

    /// Provider for `api_key` against the default address.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    /// The configured base address.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/accounts:{}", self.base_url, method);
        debug!(method, "sending identity request");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|err| {
                let err = if err.is_timeout() {
                    Error::Network("Request timed out".to_string())
                } else {
                    Error::Network(err.to_string())
                };
                warn!(method, error = %err, "identity request failed");
                err
            })?;

        let status = response.status();
        if !status.is_success() {
            let err = match response.json::<ErrorEnvelope>().await {
                Ok(envelope) => Error::Auth(envelope.error.message),
                Err(_) => Error::Http {
                    status: status.as_u16(),
                },
            };
            warn!(method, error = %err, "identity request failed");
            return Err(err);
        }

        response
            .json::<T>()
            .await
            .map_err(|err| Error::Decode(err.to_string()))
    }

    fn remember(&self, response: &AccountResponse) -> Session {
        let session = response.session();
        let mut current = self.current.lock();
        let id_token = response
            .id_token
            .clone()
            .or_else(|| current.as_ref().map(|user| user.id_token.clone()))
            .unwrap_or_default();
        *current = Some(SignedInUser {
            session: session.clone(),
            id_token,
        });
        session
    }

    /// Drop the held session after the provider rejected its token.
    fn expire(&self) {
        if self.current.lock().take().is_some() {
            let _ = self.changes.send(None);
        }
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<Session> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let response: AccountResponse = self.call("signUp", &request).await?;
        Ok(self.remember(&response))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let response: AccountResponse = self.call("signInWithPassword", &request).await?;
        Ok(self.remember(&response))
    }

    async fn sign_out(&self) -> Result<()> {
        *self.current.lock() = None;
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<()> {
        let request = OobRequest {
            request_type: "PASSWORD_RESET",
            email,
        };
        let _: serde_json::Value = self.call("sendOobCode", &request).await?;
        Ok(())
    }

    async fn update_profile(&self, display_name: &str) -> Result<Session> {
        let id_token = self
            .current
            .lock()
            .as_ref()
            .map(|user| user.id_token.clone())
            .ok_or_else(|| Error::auth("USER_NOT_FOUND"))?;

        let request = UpdateRequest {
            id_token: &id_token,
            display_name,
            return_secure_token: true,
        };
        match self.call::<_, AccountResponse>("update", &request).await {
            Ok(response) => Ok(self.remember(&response)),
            Err(Error::Auth(message)) => {
                if TOKEN_REJECTIONS.iter().any(|code| message.starts_with(code)) {
                    self.expire();
                }
                Err(Error::Auth(message))
            }
            Err(err) => Err(err),
        }
    }

    fn current_session(&self) -> Option<Session> {
        self.current.lock().as_ref().map(|user| user.session.clone())
    }

    fn session_changes(&self) -> broadcast::Receiver<Option<Session>> {
        self.changes.subscribe()
    }
}

/// Builder for [`FirebaseIdentityProvider`].
#[derive(Debug, Default)]
pub struct FirebaseIdentityProviderBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl FirebaseIdentityProviderBuilder {
    /// Set the web API key (required).
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the base address (default: the public Identity Toolkit v1 API).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Bound every request to `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the provider.
    pub fn build(self) -> Result<FirebaseIdentityProvider> {
        let api_key = self
            .api_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::validation("Firebase API key is required"))?;

        let mut builder = Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Network(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_IDENTITY_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(FirebaseIdentityProvider {
            client,
            base_url,
            api_key,
            current: Mutex::new(None),
            changes,
        })
    }
}
