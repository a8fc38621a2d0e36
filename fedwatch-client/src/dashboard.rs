//! Concurrent aggregation of the three dashboard resources.
//!
//! [`DataAggregator::fetch_all`] issues the metrics, history and
//! participation fetches concurrently and joins them fail-fast: if any one
//! fails, the whole aggregation fails with that error and no partial
//! snapshot is exposed. Substituting fallback values for a missing snapshot
//! is the consumer's job.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, warn};

use fedwatch_types::{
    DashboardMetrics, DashboardSnapshot, FetchState, ParticipationBucket, Result, RoundRecord,
};

use crate::fetch::FetchCell;

/// Where the dashboard resources come from.
#[async_trait]
pub trait DashboardSource: Send + Sync {
    /// Current aggregate metrics.
    async fn metrics(&self) -> Result<DashboardMetrics>;

    /// Training history ordered by round.
    async fn performance_history(&self) -> Result<Vec<RoundRecord>>;

    /// Participation breakdown.
    async fn participation(&self) -> Result<Vec<ParticipationBucket>>;
}

/// Fetches and merges the dashboard resources.
///
/// `fetch_all` and `refetch` may be called at any time, including while
/// an earlier call is still pending; only the latest call's outcome is
/// committed to [`DataAggregator::state`].
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use fedwatch_client::{ApiClient, DataAggregator};
///
/// # async fn run() -> fedwatch_types::Result<()> {
/// let aggregator = DataAggregator::new(Arc::new(ApiClient::new("http://localhost:5000")?));
/// match aggregator.fetch_all().await {
///     Ok(snapshot) => println!("{} rounds", snapshot.performance_history.len()),
///     Err(err) => println!("dashboard unavailable: {}", err),
/// }
/// # Ok(())
/// # }
/// ```
pub struct DataAggregator {
    source: Arc<dyn DashboardSource>,
    cell: FetchCell<DashboardSnapshot>,
}

impl DataAggregator {
    /// Create an aggregator over `source`. The state starts idle.
    pub fn new(source: Arc<dyn DashboardSource>) -> Self {
        Self {
            source,
            cell: FetchCell::new(),
        }
    }

    /// Fetch all three resources concurrently and merge them.
    pub async fn fetch_all(&self) -> Result<DashboardSnapshot> {
        let source = self.source.clone();
        let result = self
            .cell
            .run(async move {
                let (metrics, performance_history, participation) = futures_util::try_join!(
                    source.metrics(),
                    source.performance_history(),
                    source.participation(),
                )?;
                Ok(DashboardSnapshot {
                    metrics,
                    performance_history,
                    participation,
                })
            })
            .await;

        match &result {
            Ok(snapshot) => debug!(
                rounds = snapshot.performance_history.len(),
                buckets = snapshot.participation.len(),
                "dashboard data fetched"
            ),
            Err(err) => warn!(error = %err, "dashboard data fetch failed"),
        }
        result
    }

    /// Same as [`DataAggregator::fetch_all`].
    pub async fn refetch(&self) -> Result<DashboardSnapshot> {
        self.fetch_all().await
    }

    /// The current state.
    pub fn state(&self) -> FetchState<DashboardSnapshot> {
        self.cell.state()
    }

    /// A receiver notified on every committed state.
    pub fn subscribe(&self) -> watch::Receiver<FetchState<DashboardSnapshot>> {
        self.cell.subscribe()
    }
}

impl std::fmt::Debug for DataAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataAggregator")
            .field("state", &self.cell.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use fedwatch_types::{Error, ErrorKind};
    use tokio::sync::oneshot;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::ApiClient;

    fn metrics(accuracy: f64) -> DashboardMetrics {
        DashboardMetrics {
            accuracy,
            f1_score: 0.8,
            participating_hospitals: 3,
            total_hospitals: 4,
            data_points: 900,
        }
    }

    fn history() -> Vec<RoundRecord> {
        vec![RoundRecord {
            round: 1,
            accuracy: 0.7,
            f1_score: 0.65,
            hospitals: 3,
        }]
    }

    fn buckets() -> Vec<ParticipationBucket> {
        vec![
            ParticipationBucket::new("Active", 3, "#10B981"),
            ParticipationBucket::new("Inactive", 1, "#6B7280"),
        ]
    }

    /// Source with fixed outcomes per resource.
    struct StaticSource {
        metrics: Result<DashboardMetrics>,
        history: Result<Vec<RoundRecord>>,
        participation: Result<Vec<ParticipationBucket>>,
        calls: AtomicUsize,
    }

    impl StaticSource {
        fn ok() -> Self {
            Self {
                metrics: Ok(metrics(0.9)),
                history: Ok(history()),
                participation: Ok(buckets()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DashboardSource for StaticSource {
        async fn metrics(&self) -> Result<DashboardMetrics> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.metrics.clone()
        }

        async fn performance_history(&self) -> Result<Vec<RoundRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.history.clone()
        }

        async fn participation(&self) -> Result<Vec<ParticipationBucket>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.participation.clone()
        }
    }

    #[tokio::test]
    async fn test_all_succeed() {
        let source = Arc::new(StaticSource::ok());
        let aggregator = DataAggregator::new(source.clone());

        let snapshot = aggregator.fetch_all().await.unwrap();
        assert_eq!(snapshot.metrics, metrics(0.9));
        assert_eq!(snapshot.performance_history, history());
        assert_eq!(snapshot.participation, buckets());
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);

        let state = aggregator.state();
        assert_eq!(state.data, Some(snapshot));
        assert!(state.error.is_none());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_single_failure_voids_everything() {
        let failures = [
            StaticSource {
                metrics: Err(Error::Http { status: 500 }),
                ..StaticSource::ok()
            },
            StaticSource {
                history: Err(Error::Http { status: 500 }),
                ..StaticSource::ok()
            },
            StaticSource {
                participation: Err(Error::Http { status: 500 }),
                ..StaticSource::ok()
            },
        ];

        for source in failures {
            let aggregator = DataAggregator::new(Arc::new(source));
            let err = aggregator.fetch_all().await.unwrap_err();
            assert_eq!(err, Error::Http { status: 500 });

            let state = aggregator.state();
            assert!(state.data.is_none());
            assert_eq!(state.error_message().as_deref(), Some("HTTP error! status: 500"));
            assert!(!state.loading);
        }
    }

    #[tokio::test]
    async fn test_multiple_failures_report_one_error() {
        let source = StaticSource {
            metrics: Err(Error::Network("connection refused".into())),
            history: Err(Error::Network("connection refused".into())),
            participation: Err(Error::Network("connection refused".into())),
            calls: AtomicUsize::new(0),
        };
        let aggregator = DataAggregator::new(Arc::new(source));
        let err = aggregator.fetch_all().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(aggregator.state().error.is_some());
    }

    /// Source whose history endpoint can be switched off.
    struct FlakySource {
        history_down: AtomicBool,
    }

    #[async_trait]
    impl DashboardSource for FlakySource {
        async fn metrics(&self) -> Result<DashboardMetrics> {
            Ok(metrics(0.9))
        }

        async fn performance_history(&self) -> Result<Vec<RoundRecord>> {
            if self.history_down.load(Ordering::SeqCst) {
                Err(Error::Http { status: 404 })
            } else {
                Ok(history())
            }
        }

        async fn participation(&self) -> Result<Vec<ParticipationBucket>> {
            Ok(buckets())
        }
    }

    #[tokio::test]
    async fn test_failure_after_success_drops_old_snapshot() {
        let source = Arc::new(FlakySource {
            history_down: AtomicBool::new(false),
        });
        let aggregator = DataAggregator::new(source.clone());
        aggregator.fetch_all().await.unwrap();
        assert!(aggregator.state().data.is_some());

        source.history_down.store(true, Ordering::SeqCst);
        aggregator.refetch().await.unwrap_err();

        let state = aggregator.state();
        assert!(state.data.is_none());
        assert_eq!(state.error, Some(Error::Http { status: 404 }));
    }

    /// Source whose metrics responses are released one at a time, in the
    /// order the test chooses.
    struct GatedSource {
        gates: Mutex<Vec<oneshot::Receiver<DashboardMetrics>>>,
    }

    #[async_trait]
    impl DashboardSource for GatedSource {
        async fn metrics(&self) -> Result<DashboardMetrics> {
            let gate = self.gates.lock().unwrap().remove(0);
            gate.await.map_err(|_| Error::Network("gate dropped".into()))
        }

        async fn performance_history(&self) -> Result<Vec<RoundRecord>> {
            Ok(history())
        }

        async fn participation(&self) -> Result<Vec<ParticipationBucket>> {
            Ok(buckets())
        }
    }

    #[tokio::test]
    async fn test_refetch_wins_over_slow_earlier_call() {
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        let source = GatedSource {
            gates: Mutex::new(vec![first_rx, second_rx]),
        };
        let aggregator = Arc::new(DataAggregator::new(Arc::new(source)));

        let first = tokio::spawn({
            let aggregator = aggregator.clone();
            async move { aggregator.fetch_all().await }
        });
        tokio::task::yield_now().await;
        assert!(aggregator.state().loading);

        let second = tokio::spawn({
            let aggregator = aggregator.clone();
            async move { aggregator.refetch().await }
        });
        tokio::task::yield_now().await;

        // The newer call resolves first...
        second_tx.send(metrics(0.95)).unwrap();
        let newer = second.await.unwrap().unwrap();
        assert_eq!(newer.metrics.accuracy, 0.95);
        assert_eq!(aggregator.state().data.as_ref(), Some(&newer));

        // ...and the older one resolving afterwards changes nothing.
        first_tx.send(metrics(0.5)).unwrap();
        let older = first.await.unwrap().unwrap();
        assert_eq!(older.metrics.accuracy, 0.5);

        let state = aggregator.state();
        assert_eq!(state.data.map(|s| s.metrics.accuracy), Some(0.95));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_requests_run_concurrently_against_server() {
        let server = MockServer::start().await;
        let delay = std::time::Duration::from_millis(300);
        Mock::given(method("GET"))
            .and(path("/api/dashboard/metrics"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(delay)
                    .set_body_json(serde_json::json!({
                        "accuracy": 0.847,
                        "f1Score": 0.823,
                        "participatingHospitals": 12,
                        "totalHospitals": 15,
                        "dataPoints": 125000
                    })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/dashboard/performance-history"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(delay)
                    .set_body_json(serde_json::json!([
                        {"round": 1, "accuracy": 0.72, "f1Score": 0.68, "hospitals": 8},
                        {"round": 2, "accuracy": 0.75, "f1Score": 0.71, "hospitals": 10}
                    ])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/dashboard/hospital-participation"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(delay)
                    .set_body_json(serde_json::json!([
                        {"name": "Active", "value": 12, "color": "#10B981"}
                    ])),
            )
            .mount(&server)
            .await;

        let aggregator = DataAggregator::new(Arc::new(ApiClient::new(server.uri()).unwrap()));
        let started = std::time::Instant::now();
        let snapshot = aggregator.fetch_all().await.unwrap();

        assert!(started.elapsed() < delay * 3);
        assert_eq!(snapshot.performance_history.len(), 2);
        assert_eq!(snapshot.metrics.total_hospitals, 15);
    }

    #[tokio::test]
    async fn test_server_error_on_one_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/dashboard/performance-history"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": "database unavailable"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let aggregator = DataAggregator::new(Arc::new(ApiClient::new(server.uri()).unwrap()));
        let err = aggregator.fetch_all().await.unwrap_err();
        assert!(matches!(err, Error::Http { status: 500 } | Error::Decode(_)));
        assert!(aggregator.state().data.is_none());
    }
}
