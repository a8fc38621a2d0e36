//! Local checks run before any provider call.

use fedwatch_types::{Error, Result};

/// Shortest password the sign-up form accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

/// A sign-up form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    /// The password typed a second time.
    pub confirmation: String,
    pub display_name: Option<String>,
}

impl SignUpRequest {
    /// A request whose confirmation matches `password`.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        let password = password.into();
        Self {
            email: email.into(),
            confirmation: password.clone(),
            password,
            display_name: None,
        }
    }

    /// Set the confirmation value.
    pub fn with_confirmation(mut self, confirmation: impl Into<String>) -> Self {
        self.confirmation = confirmation.into();
        self
    }

    /// Set the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Check the confirmation, then the password length.
    pub fn validate(&self) -> Result<()> {
        if self.password != self.confirmation {
            return Err(Error::validation("Passwords do not match"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }

    /// The display name, ignoring blank values.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
