//! Dashboard data as a consumer shows it: live values where the backend
//! delivered them, fallbacks everywhere else.

use serde::Serialize;

use fedwatch_types::{
    DashboardMetrics, DashboardSnapshot, FetchState, ParticipationBucket, RoundRecord,
};

use super::fallback::{Fallbacks, TOTAL_ROUNDS};

/// Where a displayed value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Live,
    Fallback,
}

impl Origin {
    fn of<T>(value: Option<&T>) -> Self {
        if value.is_some() {
            Origin::Live
        } else {
            Origin::Fallback
        }
    }
}

/// Origin of each dashboard field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Origins {
    pub metrics: Origin,
    pub performance_history: Origin,
    pub participation: Origin,
}

/// Resolved dashboard contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub metrics: DashboardMetrics,
    pub performance_history: Vec<RoundRecord>,
    pub participation: Vec<ParticipationBucket>,
    /// Rounds completed so far.
    pub current_round: usize,
    pub total_rounds: u32,
    pub origins: Origins,
    /// A fetch is in flight.
    pub loading: bool,
    /// Message of the last failed fetch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DashboardView {
    /// Substitute `fallbacks` for every field `state` has no data for.
    pub fn resolve(state: &FetchState<DashboardSnapshot>, fallbacks: &Fallbacks) -> Self {
        let snapshot = state.data.as_ref();
        let metrics = snapshot.map(|s| &s.metrics);
        let history = snapshot.map(|s| &s.performance_history);
        let participation = snapshot.map(|s| &s.participation);

        let origins = Origins {
            metrics: Origin::of(metrics),
            performance_history: Origin::of(history),
            participation: Origin::of(participation),
        };

        let performance_history = history
            .unwrap_or(&fallbacks.performance_history)
            .clone();

        Self {
            metrics: metrics.unwrap_or(&fallbacks.metrics).clone(),
            current_round: performance_history.len(),
            performance_history,
            participation: participation.unwrap_or(&fallbacks.participation).clone(),
            total_rounds: TOTAL_ROUNDS,
            origins,
            loading: state.loading,
            error: state.error_message(),
        }
    }

    /// Whether every field holds live data.
    pub fn is_live(&self) -> bool {
        self.origins.metrics == Origin::Live
            && self.origins.performance_history == Origin::Live
            && self.origins.participation == Origin::Live
    }
}
