//! Observable state of a re-fetchable asynchronous value.

use crate::Error;

/// The state of a fetch: the last result, whether one is in flight, and
/// the error from the last failed attempt.
///
/// `loading` and `error` are never set at the same time. Starting a new
/// fetch clears `error` and keeps `data` until that fetch completes;
/// completion replaces `data` on success and clears it on failure.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    /// The value from the last successful completion.
    pub data: Option<T>,
    /// Whether a fetch is in flight.
    pub loading: bool,
    /// The error from the last failed completion.
    pub error: Option<Error>,
}

impl<T> FetchState<T> {
    /// Nothing fetched yet, nothing in flight.
    pub fn idle() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }

    /// A fetch is in flight.
    pub fn pending() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
        }
    }

    /// A fetch completed with `data`.
    pub fn ready(data: T) -> Self {
        Self {
            data: Some(data),
            loading: false,
            error: None,
        }
    }

    /// A fetch failed with `error`.
    pub fn failed(error: Error) -> Self {
        Self {
            data: None,
            loading: false,
            error: Some(error),
        }
    }

    /// Mark a new fetch as started, keeping the last value.
    pub fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Build the state that a finished fetch produces.
    pub fn from_result(result: Result<T, Error>) -> Self {
        match result {
            Ok(data) => Self::ready(data),
            Err(error) => Self::failed(error),
        }
    }

    /// The error message, if the last fetch failed.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(Error::message)
    }

    /// Whether the last fetch completed successfully.
    pub fn is_ready(&self) -> bool {
        self.data.is_some()
    }
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self::idle()
    }
}
