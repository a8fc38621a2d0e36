//! Layered configuration: defaults, then a TOML file, then `FEDWATCH_*`
//! environment variables.
//!
//! ```toml
//! api_base_url = "http://localhost:5000"
//! health_interval_secs = 30
//! # request_timeout_secs = 10
//! # firebase_api_key = "AIza..."
//! log_level = "info"
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use fedwatch_client::{ApiClient, RequestClient, DEFAULT_BASE_URL};
use fedwatch_session::{IdentityProvider, DEFAULT_IDENTITY_BASE_URL};

/// File read when no `--config` path is given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "fedwatch.toml";

/// Prefix of the environment variables that override file settings.
pub const ENV_PREFIX: &str = "FEDWATCH";

/// Resolved settings. Read once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Backend base address.
    pub api_base_url: String,
    /// Seconds between health probes.
    pub health_interval_secs: u64,
    /// Per-request timeout. Unset means requests may take as long as they take.
    pub request_timeout_secs: Option<u64>,
    /// Web API key for the Firebase identity provider.
    pub firebase_api_key: Option<String>,
    /// Identity Toolkit base address.
    pub identity_base_url: String,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            health_interval_secs: 30,
            request_timeout_secs: None,
            firebase_api_key: None,
            identity_base_url: DEFAULT_IDENTITY_BASE_URL.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `path` (or `fedwatch.toml` if present) and the
    /// process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(
            path,
            Environment::with_prefix(ENV_PREFIX).try_parsing(true),
        )
    }

    /// Load settings with an explicit environment source.
    pub fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("api_base_url", defaults.api_base_url)?
            .set_default("health_interval_secs", defaults.health_interval_secs)?
            .set_default("identity_base_url", defaults.identity_base_url)?
            .set_default("log_level", defaults.log_level)?;

        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let settings: Settings = builder
            .add_source(env)
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.health_interval_secs == 0 {
            bail!("health_interval_secs must be at least 1");
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            bail!("api_base_url must be an http(s) address: {}", self.api_base_url);
        }
        Ok(())
    }

    /// Replace the backend address, applying the same checks as loading.
    pub fn set_api_base_url(&mut self, base_url: impl Into<String>) -> Result<()> {
        let previous = std::mem::replace(&mut self.api_base_url, base_url.into());
        if let Err(err) = self.validate() {
            self.api_base_url = previous;
            return Err(err);
        }
        Ok(())
    }

    /// Replace the probe interval. Only whole, non-zero seconds are accepted.
    pub fn set_health_interval(&mut self, interval: Duration) -> Result<()> {
        if interval.subsec_nanos() != 0 || interval.as_secs() == 0 {
            bail!(
                "health interval must be a whole number of seconds, at least 1s (got {:?})",
                interval
            );
        }
        self.health_interval_secs = interval.as_secs();
        Ok(())
    }

    /// Interval between health probes.
    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs)
    }

    /// Request timeout, if one is configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Backend client built from these settings.
    pub fn api_client(&self) -> Result<ApiClient> {
        let mut builder = RequestClient::builder().base_url(&self.api_base_url);
        if let Some(timeout) = self.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(ApiClient::from_client(builder.build()?))
    }

    /// Identity provider built from these settings.
    ///
    /// Requires `firebase_api_key`.
    pub fn identity_provider(&self) -> Result<Arc<dyn IdentityProvider>> {
        let Some(api_key) = self.firebase_api_key.as_deref() else {
            bail!("firebase_api_key is not configured (set FEDWATCH_FIREBASE_API_KEY)");
        };

        let mut builder = fedwatch_session::FirebaseIdentityProvider::builder()
            .api_key(api_key)
            .base_url(&self.identity_base_url);
        if let Some(timeout) = self.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Arc::new(builder.build()?))
    }
}
