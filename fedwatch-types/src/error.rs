//! The error taxonomy shared by the client and session layers.

use thiserror::Error;

/// Discriminator for [`Error`].
///
/// Callers branch on this instead of inspecting message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ErrorKind {
    /// Rejected locally before anything reached the network.
    Validation,
    /// No response was obtained (DNS, refused connection, timeout).
    Network,
    /// A response arrived with a non-success status.
    Http,
    /// A success response whose body was not the expected JSON.
    Decode,
    /// The identity provider rejected the operation.
    Auth,
}

/// A failed operation, carrying a human-readable message.
///
/// The `Display` output is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Local input check failed (password too short, confirmation mismatch).
    #[error("{0}")]
    Validation(String),

    /// Transport-level failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP error! status: {status}")]
    Http {
        /// Numeric HTTP status code.
        status: u16,
    },

    /// The response body could not be decoded.
    #[error("Failed to parse response: {0}")]
    Decode(String),

    /// Identity-provider rejection, with the provider's message.
    #[error("{0}")]
    Auth(String),
}

impl Error {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Create an identity-provider error.
    pub fn auth(message: impl Into<String>) -> Self {
        Error::Auth(message.into())
    }

    /// The kind of failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Network(_) => ErrorKind::Network,
            Error::Http { .. } => ErrorKind::Http,
            Error::Decode(_) => ErrorKind::Decode,
            Error::Auth(_) => ErrorKind::Auth,
        }
    }

    /// The user-facing message.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// The HTTP status, if this is an [`Error::Http`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status } => Some(*status),
            _ => None,
        }
    }
}

/// Result alias used across fedwatch crates.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_message_matches_backend_console() {
        let err = Error::Http { status: 503 };
        assert_eq!(err.message(), "HTTP error! status: 503");
        assert_eq!(err.kind(), ErrorKind::Http);
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_validation_and_auth_messages_are_verbatim() {
        let err = Error::validation("Passwords do not match");
        assert_eq!(err.to_string(), "Passwords do not match");
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = Error::auth("INVALID_LOGIN_CREDENTIALS");
        assert_eq!(err.to_string(), "INVALID_LOGIN_CREDENTIALS");
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_kinds_are_distinct() {
        let kinds = [
            Error::Validation(String::new()).kind(),
            Error::Network(String::new()).kind(),
            Error::Http { status: 500 }.kind(),
            Error::Decode(String::new()).kind(),
            Error::Auth(String::new()).kind(),
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
