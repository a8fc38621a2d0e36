//! # fedwatch-types
//!
//! Core types shared by every fedwatch crate. This crate defines the data
//! model that the HTTP client produces, the session layer owns, and the
//! command-line consumer renders.
//!
//! ## Design Goals
//!
//! - **Plain data**: No I/O, no runtime, no global state
//! - **Optional serialization**: Enable the `serde` feature for JSON support
//!   (field names match the backend's camelCase wire format)
//! - **Tagged errors**: One [`Error`] type whose [`ErrorKind`] callers can
//!   branch on without matching message text
//!
//! ## Features
//!
//! - `serde`: JSON serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use fedwatch_types::{DashboardMetrics, FetchState};
//!
//! let mut state: FetchState<DashboardMetrics> = FetchState::pending();
//! assert!(state.loading);
//!
//! state = FetchState::ready(DashboardMetrics {
//!     accuracy: 0.9,
//!     f1_score: 0.88,
//!     participating_hospitals: 4,
//!     total_hospitals: 5,
//!     data_points: 1200,
//! });
//! assert!(state.data.is_some());
//! assert!(state.error.is_none());
//! ```

mod dashboard;
mod error;
mod fetch;
mod health;
mod hospital;
mod session;

pub use dashboard::*;
pub use error::*;
pub use fetch::*;
pub use health::*;
pub use hospital::*;
pub use session::*;

/// Unix timestamp in milliseconds for the current instant.
///
/// Returns 0 if the system clock is set before the epoch.
pub fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
