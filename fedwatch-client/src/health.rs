//! Periodic backend health monitoring.
//!
//! A [`HealthMonitor`] runs a [`Probe`] immediately on start and then on
//! every tick of a fixed period (30 seconds by default), publishing a
//! [`HealthState`] through a watch channel:
//!
//! ```text
//! Unknown ──▶ Checking ──▶ Connected ──▶ Checking ──▶ Disconnected ──▶ ...
//! ```
//!
//! Probe failures are never surfaced as errors; they only move the status
//! to `Disconnected`.
//!
//! Starting returns a [`MonitorHandle`]. Stopping (or dropping) the handle
//! cancels the timer, and a probe that is still in flight at that point is
//! discarded without touching the state.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fedwatch_client::{ApiClient, HealthMonitor, HealthProbe};
//!
//! # async fn run() -> fedwatch_types::Result<()> {
//! let api = ApiClient::new("http://localhost:5000")?;
//! let monitor = HealthMonitor::new(Arc::new(HealthProbe::new(api)));
//!
//! let handle = monitor.start();
//! let mut updates = handle.subscribe();
//! while updates.changed().await.is_ok() {
//!     println!("{:?}", updates.borrow().status);
//! }
//! handle.stop().await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use fedwatch_types::{current_timestamp_ms, HealthState, HealthStatus, Result};

use crate::api::ApiClient;

/// Probe period used when none is configured.
pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(30);

/// A single reachability check.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Succeeds if the backend is reachable.
    async fn probe(&self) -> Result<()>;
}

/// Probes `GET /health` on the backend.
#[derive(Debug, Clone)]
pub struct HealthProbe {
    api: ApiClient,
}

impl HealthProbe {
    /// Create a probe against `api`.
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Probe for HealthProbe {
    async fn probe(&self) -> Result<()> {
        self.api.health_check().await
    }
}

/// Schedules probes on a fixed period.
#[derive(Clone)]
pub struct HealthMonitor {
    probe: Arc<dyn Probe>,
    interval: Duration,
}

impl HealthMonitor {
    /// Monitor using `probe` every 30 seconds.
    pub fn new(probe: Arc<dyn Probe>) -> Self {
        Self {
            probe,
            interval: DEFAULT_HEALTH_INTERVAL,
        }
    }

    /// Set the probe period (at least one millisecond).
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    /// The probe period.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start probing in a background task.
    ///
    /// Each start gets a fresh state that begins at `Unknown`.
    pub fn start(&self) -> MonitorHandle {
        let (state_tx, state_rx) = watch::channel(HealthState::unknown());
        let cancel = CancellationToken::new();

        info!(interval_ms = self.interval.as_millis() as u64, "starting health monitor");

        let task = tokio::spawn(health_worker(
            self.probe.clone(),
            self.interval,
            state_tx,
            cancel.clone(),
        ));

        MonitorHandle {
            state: state_rx,
            cancel,
            task: Some(task),
        }
    }
}

impl std::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("interval", &self.interval)
            .finish()
    }
}

/// Handle for a running monitor.
///
/// Drop this handle to stop monitoring, or call `stop()` to also wait for
/// the background task to finish.
#[derive(Debug)]
pub struct MonitorHandle {
    state: watch::Receiver<HealthState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// The current state.
    pub fn state(&self) -> HealthState {
        *self.state.borrow()
    }

    /// A receiver that observes every committed state.
    pub fn subscribe(&self) -> watch::Receiver<HealthState> {
        self.state.clone()
    }

    /// Whether the monitor is still scheduling probes.
    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Stop probing and wait for the background task to exit.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        info!("health monitor stopped");
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn health_worker(
    probe: Arc<dyn Probe>,
    interval: Duration,
    state: watch::Sender<HealthState>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    // A probe never overlaps the next one; ticks that elapse during a slow
    // probe are dropped.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut last_outcome: Option<HealthStatus> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if !commit(&state, &cancel, |current| current.checking()) {
            break;
        }

        let outcome = tokio::select! {
            _ = cancel.cancelled() => break,
            outcome = probe.probe() => outcome,
        };

        let connected = match outcome {
            Ok(()) => true,
            Err(err) => {
                debug!(error = %err, "health probe failed");
                false
            }
        };

        let completed = HealthState::completed(connected, current_timestamp_ms());
        if !commit(&state, &cancel, |_| completed) {
            break;
        }
        if last_outcome != Some(completed.status) {
            info!(status = ?completed.status, "backend health changed");
            last_outcome = Some(completed.status);
        }
    }

    debug!("health worker exiting");
}

/// Apply `next` unless the monitor has been cancelled.
///
/// The cancellation check runs under the channel's lock, so nothing is
/// committed once `cancel` has fired.
fn commit(
    state: &watch::Sender<HealthState>,
    cancel: &CancellationToken,
    next: impl FnOnce(HealthState) -> HealthState,
) -> bool {
    let mut applied = false;
    state.send_if_modified(|current| {
        if cancel.is_cancelled() {
            return false;
        }
        applied = true;
        let updated = next(*current);
        let changed = updated != *current;
        *current = updated;
        changed
    });
    applied
}
