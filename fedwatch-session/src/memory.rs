//! In-process identity provider.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use fedwatch_types::{Error, Result, Session};

use crate::provider::{IdentityProvider, CHANGE_CHANNEL_CAPACITY};

#[derive(Debug, Clone)]
struct Account {
    id: String,
    password: String,
    display_name: Option<String>,
}

#[derive(Debug, Default)]
struct Accounts {
    by_email: HashMap<String, Account>,
    current: Option<String>,
    next_id: u64,
    reset_requests: Vec<String>,
}

impl Accounts {
    fn session(&self, email: &str) -> Option<Session> {
        self.by_email.get(email).map(|account| Session {
            id: account.id.clone(),
            email: email.to_string(),
            display_name: account.display_name.clone(),
            is_authenticated: true,
        })
    }

    fn insert(&mut self, email: &str, password: &str) -> String {
        self.next_id += 1;
        let id = format!("user-{}", self.next_id);
        self.by_email.insert(
            email.to_string(),
            Account {
                id: id.clone(),
                password: password.to_string(),
                display_name: None,
            },
        );
        id
    }
}

/// An identity provider that keeps accounts in memory.
///
/// Rejections use the same message codes as the Identity Toolkit REST API
/// (`EMAIL_EXISTS`, `INVALID_LOGIN_CREDENTIALS`, `EMAIL_NOT_FOUND`, ...).
///
/// # Example
///
/// ```rust
/// use fedwatch_session::MemoryIdentityProvider;
///
/// let provider = MemoryIdentityProvider::new();
/// provider.add_account("doc@hospital.org", "secret1");
/// assert_eq!(provider.account_count(), 1);
/// ```
#[derive(Debug)]
pub struct MemoryIdentityProvider {
    accounts: Mutex<Accounts>,
    changes: broadcast::Sender<Option<Session>>,
    calls: AtomicUsize,
}

impl MemoryIdentityProvider {
    /// A provider with no accounts.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            accounts: Mutex::new(Accounts::default()),
            changes,
            calls: AtomicUsize::new(0),
        }
    }

    /// Register an account directly, without signing it in.
    pub fn add_account(&self, email: &str, password: &str) -> Session {
        let id = self.accounts.lock().insert(email, password);
        Session::new(id, email)
    }

    /// Number of registered accounts.
    pub fn account_count(&self) -> usize {
        self.accounts.lock().by_email.len()
    }

    /// Number of provider operations invoked so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Addresses that password resets were requested for, in order.
    pub fn reset_requests(&self) -> Vec<String> {
        self.accounts.lock().reset_requests.clone()
    }

    /// End the current session from the provider side, as an expired or
    /// revoked token would.
    pub fn revoke(&self) {
        let had_session = self.accounts.lock().current.take().is_some();
        if had_session {
            let _ = self.changes.send(None);
        }
    }

    /// Sign `email` in from the provider side, as a session restored on
    /// another device would. Returns `false` for unknown accounts.
    pub fn restore(&self, email: &str) -> bool {
        let session = {
            let mut accounts = self.accounts.lock();
            let Some(session) = accounts.session(email) else {
                return false;
            };
            accounts.current = Some(email.to_string());
            session
        };
        let _ = self.changes.send(Some(session));
        true
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<Session> {
        self.record_call();
        let mut accounts = self.accounts.lock();
        if !email.contains('@') {
            return Err(Error::auth("INVALID_EMAIL"));
        }
        if accounts.by_email.contains_key(email) {
            return Err(Error::auth("EMAIL_EXISTS"));
        }
        if password.chars().count() < 6 {
            return Err(Error::auth(
                "WEAK_PASSWORD : Password should be at least 6 characters",
            ));
        }
        accounts.insert(email, password);
        accounts.current = Some(email.to_string());
        accounts
            .session(email)
            .ok_or_else(|| Error::auth("USER_NOT_FOUND"))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        self.record_call();
        let mut accounts = self.accounts.lock();
        match accounts.by_email.get(email) {
            Some(account) if account.password == password => {}
            _ => return Err(Error::auth("INVALID_LOGIN_CREDENTIALS")),
        }
        accounts.current = Some(email.to_string());
        accounts
            .session(email)
            .ok_or_else(|| Error::auth("USER_NOT_FOUND"))
    }

    async fn sign_out(&self) -> Result<()> {
        self.record_call();
        self.accounts.lock().current = None;
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<()> {
        self.record_call();
        let mut accounts = self.accounts.lock();
        if !accounts.by_email.contains_key(email) {
            return Err(Error::auth("EMAIL_NOT_FOUND"));
        }
        accounts.reset_requests.push(email.to_string());
        Ok(())
    }

    async fn update_profile(&self, display_name: &str) -> Result<Session> {
        self.record_call();
        let mut accounts = self.accounts.lock();
        let email = accounts
            .current
            .clone()
            .ok_or_else(|| Error::auth("USER_NOT_FOUND"))?;
        if let Some(account) = accounts.by_email.get_mut(&email) {
            account.display_name = Some(display_name.to_string());
        }
        accounts
            .session(&email)
            .ok_or_else(|| Error::auth("USER_NOT_FOUND"))
    }

    fn current_session(&self) -> Option<Session> {
        let accounts = self.accounts.lock();
        accounts
            .current
            .as_deref()
            .and_then(|email| accounts.session(email))
    }

    fn session_changes(&self) -> broadcast::Receiver<Option<Session>> {
        self.changes.subscribe()
    }
}
