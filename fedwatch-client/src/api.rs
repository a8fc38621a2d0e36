//! Typed endpoints of the dashboard backend.

use async_trait::async_trait;

use fedwatch_types::{
    DashboardMetrics, Hospital, NewHospital, ParticipationBucket, Result, RoundRecord,
};

use crate::dashboard::DashboardSource;
use crate::request::{RequestClient, RequestOptions};

/// Endpoint paths.
pub mod endpoints {
    /// Liveness probe.
    pub const HEALTH: &str = "/health";
    /// Current aggregate metrics.
    pub const DASHBOARD_METRICS: &str = "/api/dashboard/metrics";
    /// Ordered training-round history.
    pub const PERFORMANCE_HISTORY: &str = "/api/dashboard/performance-history";
    /// Participation breakdown.
    pub const HOSPITAL_PARTICIPATION: &str = "/api/dashboard/hospital-participation";
    /// Hospital registry.
    pub const HOSPITALS: &str = "/api/hospitals";
}

/// The backend API, one method per endpoint.
///
/// # Example
///
/// ```rust,no_run
/// use fedwatch_client::ApiClient;
///
/// # async fn run() -> fedwatch_types::Result<()> {
/// let api = ApiClient::new("http://localhost:5000")?;
/// for hospital in api.hospitals().await? {
///     println!("{} ({})", hospital.name, hospital.location.unwrap_or_default());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: RequestClient,
}

impl ApiClient {
    /// Wrap an existing request client.
    pub fn from_client(http: RequestClient) -> Self {
        Self { http }
    }

    /// Client for `base_url` with default settings.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self::from_client(RequestClient::new(base_url)?))
    }

    /// The underlying request client.
    pub fn http(&self) -> &RequestClient {
        &self.http
    }

    /// `GET /health`. Any 2xx counts as healthy; the body is ignored.
    pub async fn health_check(&self) -> Result<()> {
        self.http
            .send(endpoints::HEALTH, RequestOptions::get())
            .await
            .map(|_| ())
    }

    /// `GET /api/dashboard/metrics`.
    pub async fn dashboard_metrics(&self) -> Result<DashboardMetrics> {
        self.http
            .request(endpoints::DASHBOARD_METRICS, RequestOptions::get())
            .await
    }

    /// `GET /api/dashboard/performance-history`.
    pub async fn performance_history(&self) -> Result<Vec<RoundRecord>> {
        self.http
            .request(endpoints::PERFORMANCE_HISTORY, RequestOptions::get())
            .await
    }

    /// `GET /api/dashboard/hospital-participation`.
    pub async fn hospital_participation(&self) -> Result<Vec<ParticipationBucket>> {
        self.http
            .request(endpoints::HOSPITAL_PARTICIPATION, RequestOptions::get())
            .await
    }

    /// `GET /api/hospitals`.
    pub async fn hospitals(&self) -> Result<Vec<Hospital>> {
        self.http
            .request(endpoints::HOSPITALS, RequestOptions::get())
            .await
    }

    /// `POST /api/hospitals`. Returns the backend's echo of the record.
    pub async fn create_hospital(&self, hospital: &NewHospital) -> Result<Hospital> {
        self.http
            .request(endpoints::HOSPITALS, RequestOptions::post(hospital)?)
            .await
    }
}

#[async_trait]
impl DashboardSource for ApiClient {
    async fn metrics(&self) -> Result<DashboardMetrics> {
        self.dashboard_metrics().await
    }

    async fn performance_history(&self) -> Result<Vec<RoundRecord>> {
        ApiClient::performance_history(self).await
    }

    async fn participation(&self) -> Result<Vec<ParticipationBucket>> {
        self.hospital_participation().await
    }
}
