//! JSON export of the resolved dashboard and backend health.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use fedwatch_types::{current_timestamp_ms, HealthState};

use crate::app::App;
use crate::data::DashboardView;

/// Everything written by `fedwatch export`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    /// Unix timestamp in milliseconds.
    pub exported_at_ms: u64,
    pub api_base_url: String,
    pub health: HealthState,
    pub dashboard: DashboardView,
}

impl ExportDocument {
    /// Probe health and fetch the dashboard concurrently.
    pub async fn collect(app: &App) -> Self {
        let (health, dashboard) = tokio::join!(app.probe_health(), app.load_dashboard());
        Self {
            exported_at_ms: current_timestamp_ms(),
            api_base_url: app.settings().api_base_url.clone(),
            health,
            dashboard,
        }
    }

    /// Write the document as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write export to {}", path.display()))
    }
}
