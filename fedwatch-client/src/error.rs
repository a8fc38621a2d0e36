//! Mapping transport failures onto the shared error taxonomy.

use std::error::Error as _;

use fedwatch_types::Error;

/// Classify a `reqwest` failure.
///
/// Anything that prevented a response from arriving is a network error;
/// a body that did not decode is a decode error carrying the parser's
/// reason.
pub(crate) fn classify(err: reqwest::Error) -> Error {
    if let Some(status) = err.status() {
        Error::Http {
            status: status.as_u16(),
        }
    } else if err.is_decode() {
        match err.source() {
            Some(source) => Error::Decode(format!("{}: {}", err, source)),
            None => Error::Decode(err.to_string()),
        }
    } else if err.is_timeout() {
        Error::Network("Request timed out".to_string())
    } else {
        Error::Network(err.to_string())
    }
}
