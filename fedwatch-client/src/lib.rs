//! # fedwatch-client
//!
//! HTTP access to the federated-learning dashboard backend.
//!
//! This crate provides the pieces a dashboard needs to talk to the backend:
//!
//! - [`RequestClient`] - JSON request wrapper with uniform error mapping
//! - [`ApiClient`] - one typed method per backend endpoint
//! - [`HealthMonitor`] - periodic liveness probe with a cancellable handle
//! - [`DataAggregator`] - concurrent, fail-fast fetch of the dashboard resources
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fedwatch_client::{ApiClient, DataAggregator, HealthMonitor, HealthProbe};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = ApiClient::new("http://localhost:5000")?;
//!
//!     let monitor = HealthMonitor::new(Arc::new(HealthProbe::new(api.clone()))).start();
//!
//!     let aggregator = DataAggregator::new(Arc::new(api));
//!     let snapshot = aggregator.fetch_all().await?;
//!     println!("accuracy: {:.3}", snapshot.metrics.accuracy);
//!
//!     monitor.stop().await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod dashboard;
mod error;
pub mod fetch;
pub mod health;
pub mod request;

pub use api::{endpoints, ApiClient};
pub use dashboard::{DashboardSource, DataAggregator};
pub use fetch::FetchCell;
pub use health::{HealthMonitor, HealthProbe, MonitorHandle, Probe, DEFAULT_HEALTH_INTERVAL};
pub use request::{RequestClient, RequestClientBuilder, RequestOptions, DEFAULT_BASE_URL};

// Re-export types for convenience
pub use fedwatch_types::{
    DashboardMetrics, DashboardSnapshot, Error, ErrorKind, FetchState, HealthState, HealthStatus,
    Hospital, NewHospital, ParticipationBucket, Result, RoundRecord,
};
