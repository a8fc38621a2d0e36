//! Wiring between settings, the backend client and the session manager.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::debug;

use fedwatch_client::{
    ApiClient, DataAggregator, HealthMonitor, HealthProbe, MonitorHandle, Probe,
};
use fedwatch_session::SessionManager;
use fedwatch_types::{current_timestamp_ms, HealthState};

use crate::data::{DashboardView, Fallbacks};
use crate::settings::Settings;

/// Application services built once from [`Settings`].
#[derive(Debug, Clone)]
pub struct App {
    settings: Settings,
    api: ApiClient,
    fallbacks: Fallbacks,
}

impl App {
    /// Build the services described by `settings`.
    pub fn new(settings: Settings) -> Result<Self> {
        let api = settings.api_client()?;
        Ok(Self::with_api(settings, api))
    }

    /// Use an existing backend client.
    pub fn with_api(settings: Settings, api: ApiClient) -> Self {
        Self {
            settings,
            api,
            fallbacks: Fallbacks::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Run a single health probe.
    pub async fn probe_health(&self) -> HealthState {
        let connected = HealthProbe::new(self.api.clone()).probe().await.is_ok();
        HealthState::completed(connected, current_timestamp_ms())
    }

    /// Fetch the dashboard once and fill gaps with fallbacks.
    pub async fn load_dashboard(&self) -> DashboardView {
        let aggregator = DataAggregator::new(Arc::new(self.api.clone()));
        // The outcome is carried in the aggregator state.
        let _ = aggregator.fetch_all().await;
        DashboardView::resolve(&aggregator.state(), &self.fallbacks)
    }

    /// Start the health monitor and the dashboard aggregator for a live view.
    ///
    /// Both stop when the returned activation is deactivated or dropped.
    pub fn activate_dashboard(&self) -> DashboardActivation {
        let probe = Arc::new(HealthProbe::new(self.api.clone()));
        let monitor = HealthMonitor::new(probe)
            .with_interval(self.settings.health_interval())
            .start();
        debug!(interval = ?self.settings.health_interval(), "dashboard view activated");

        DashboardActivation {
            monitor,
            aggregator: DataAggregator::new(Arc::new(self.api.clone())),
            fallbacks: self.fallbacks.clone(),
        }
    }

    /// Session manager backed by the configured identity provider.
    pub fn session_manager(&self) -> Result<SessionManager> {
        Ok(SessionManager::new(self.settings.identity_provider()?))
    }
}

/// A live dashboard view: a running health monitor plus a re-fetchable
/// aggregation.
#[derive(Debug)]
pub struct DashboardActivation {
    monitor: MonitorHandle,
    aggregator: DataAggregator,
    fallbacks: Fallbacks,
}

impl DashboardActivation {
    /// Current backend health.
    pub fn health(&self) -> HealthState {
        self.monitor.state()
    }

    /// Receiver notified on every health transition.
    pub fn health_updates(&self) -> watch::Receiver<HealthState> {
        self.monitor.subscribe()
    }

    /// Current dashboard contents.
    pub fn view(&self) -> DashboardView {
        DashboardView::resolve(&self.aggregator.state(), &self.fallbacks)
    }

    /// Re-fetch the dashboard and return the resulting contents.
    pub async fn refresh(&self) -> DashboardView {
        let _ = self.aggregator.refetch().await;
        self.view()
    }

    /// Stop the health monitor.
    pub async fn deactivate(self) {
        self.monitor.stop().await;
        debug!("dashboard view deactivated");
    }
}
