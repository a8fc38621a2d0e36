//! Authenticated identity of the current user.

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Session {
    /// Provider-assigned user id.
    pub id: String,
    /// Account email address.
    pub email: String,
    /// Profile display name, if one was set.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub display_name: Option<String>,
    /// Whether the provider considers the session authenticated.
    pub is_authenticated: bool,
}

impl Session {
    /// Create an authenticated session.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            display_name: None,
            is_authenticated: true,
        }
    }

    /// Set the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Display name, falling back to the email address.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}

/// What is known about the current user.
///
/// `Unresolved` means the provider has not reported yet; it is not the
/// same as `SignedOut`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// The provider has not reported a session yet.
    #[default]
    Unresolved,
    /// Nobody is signed in.
    SignedOut,
    /// A user is signed in.
    SignedIn(Session),
}

impl SessionState {
    /// Build a resolved state from an optional session.
    pub fn resolved(session: Option<Session>) -> Self {
        match session {
            Some(session) => SessionState::SignedIn(session),
            None => SessionState::SignedOut,
        }
    }

    /// The signed-in session, if any.
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::SignedIn(session) => Some(session),
            _ => None,
        }
    }

    /// Whether the provider has reported yet.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, SessionState::Unresolved)
    }

    /// Whether a user is signed in.
    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionState::SignedIn(_))
    }
}
