//! Dashboard resources served by the backend.

/// Current aggregate model metrics.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DashboardMetrics {
    /// Global model accuracy in `[0, 1]`.
    pub accuracy: f64,
    /// Global model F1 score in `[0, 1]`.
    pub f1_score: f64,
    /// Hospitals currently taking part in training.
    pub participating_hospitals: u32,
    /// All registered hospitals.
    pub total_hospitals: u32,
    /// Training samples contributed across hospitals.
    pub data_points: u64,
}

impl DashboardMetrics {
    /// Share of registered hospitals that are participating, in `[0, 1]`.
    pub fn participation_rate(&self) -> f64 {
        if self.total_hospitals == 0 {
            0.0
        } else {
            f64::from(self.participating_hospitals) / f64::from(self.total_hospitals)
        }
    }
}

/// Metrics recorded at the end of one training round.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RoundRecord {
    /// 1-based round number.
    pub round: u32,
    /// Accuracy after the round.
    pub accuracy: f64,
    /// F1 score after the round.
    pub f1_score: f64,
    /// Hospitals that contributed to the round.
    pub hospitals: u32,
}

/// One named slice of the participation breakdown.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParticipationBucket {
    /// Bucket name, e.g. "Active".
    pub name: String,
    /// Number of hospitals in the bucket.
    pub value: u32,
    /// Display colour as a hex string.
    pub color: String,
}

impl ParticipationBucket {
    /// Create a bucket.
    pub fn new(name: impl Into<String>, value: u32, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            color: color.into(),
        }
    }
}

/// The three dashboard resources, fetched together.
///
/// A snapshot only exists when all three fetches succeeded.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DashboardSnapshot {
    /// Current aggregate metrics.
    pub metrics: DashboardMetrics,
    /// Training history ordered by round.
    pub performance_history: Vec<RoundRecord>,
    /// Participation breakdown.
    pub participation: Vec<ParticipationBucket>,
}

impl DashboardSnapshot {
    /// The most recent round, if any rounds have run.
    pub fn latest_round(&self) -> Option<&RoundRecord> {
        self.performance_history.iter().max_by_key(|r| r.round)
    }
}
