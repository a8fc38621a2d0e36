//! Backend reachability status.

/// Reachability of the backend as last observed by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HealthStatus {
    /// No probe has run since the monitor started.
    #[default]
    Unknown,
    /// A probe is in flight.
    Checking,
    /// The last probe succeeded.
    Connected,
    /// The last probe failed.
    Disconnected,
}

impl HealthStatus {
    /// Short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Unknown => "Unknown",
            HealthStatus::Checking => "Checking...",
            HealthStatus::Connected => "Backend Connected",
            HealthStatus::Disconnected => "Backend Offline",
        }
    }

    /// Whether this is the outcome of a completed probe.
    pub fn is_terminal(&self) -> bool {
        matches!(self, HealthStatus::Connected | HealthStatus::Disconnected)
    }
}

/// Status plus the completion time of the last probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HealthState {
    /// Current status.
    pub status: HealthStatus,

    /// Unix timestamp in milliseconds when the last probe completed.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub last_checked_ms: Option<u64>,
}

impl HealthState {
    /// The state a monitor starts in.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Enter `Checking`, keeping the last completion time.
    pub fn checking(self) -> Self {
        Self {
            status: HealthStatus::Checking,
            ..self
        }
    }

    /// Record a completed probe.
    pub fn completed(connected: bool, at_ms: u64) -> Self {
        Self {
            status: if connected {
                HealthStatus::Connected
            } else {
                HealthStatus::Disconnected
            },
            last_checked_ms: Some(at_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checking_keeps_last_timestamp() {
        let state = HealthState::completed(true, 1_000).checking();
        assert_eq!(state.status, HealthStatus::Checking);
        assert_eq!(state.last_checked_ms, Some(1_000));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(HealthStatus::Connected.is_terminal());
        assert!(HealthStatus::Disconnected.is_terminal());
        assert!(!HealthStatus::Checking.is_terminal());
        assert!(!HealthStatus::Unknown.is_terminal());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&HealthStatus::Disconnected).unwrap();
        assert_eq!(json, "\"disconnected\"");
    }
}
