//! # fedwatch
//!
//! Command-line console for a federated hospital-learning backend.
//!
//! The library half holds what the `fedwatch` binary is built from:
//!
//! - **[`settings`]**: layered configuration ([`Settings`])
//! - **[`app`]**: service wiring and the live dashboard activation ([`App`])
//! - **[`data`]**: fallback substitution for dashboard data ([`DashboardView`])
//! - **[`report`]**: plain-text rendering
//! - **[`export`]**: JSON export ([`ExportDocument`])
//!
//! The HTTP client, health monitor and aggregator live in `fedwatch-client`;
//! identity and sessions live in `fedwatch-session`.
//!
//! ## Usage
//!
//! ```bash
//! # One-off health check against a local backend
//! fedwatch status
//!
//! # Live health + dashboard until Ctrl-C
//! fedwatch --base-url http://fl.hospital.org:5000 watch --interval 10s
//!
//! # Export the dashboard as JSON
//! fedwatch export dashboard.json
//! ```
//!
//! ### As a library
//!
//! ```rust,no_run
//! use fedwatch::{App, Settings};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let app = App::new(Settings::load(None)?)?;
//! let view = app.load_dashboard().await;
//! println!("{}", fedwatch::report::dashboard(&view));
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod data;
pub mod export;
pub mod report;
pub mod settings;

pub use app::{App, DashboardActivation};
pub use data::{DashboardView, Fallbacks};
pub use export::ExportDocument;
pub use settings::Settings;
