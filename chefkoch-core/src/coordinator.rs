//! Scheduled refresh of one entry's sensors.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info_span, Instrument};
use utoipa::ToSchema;

use crate::aggregator::Aggregator;
use crate::error::RefreshError;
use crate::types::{RefreshResult, SensorSpec};

/// What listeners see. Replaced as a whole on every publish.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct CoordinatorState {
    /// Last successfully refreshed data, keyed by sensor id.
    pub data: RefreshResult,
    pub last_update_success: bool,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Owns the sensor specs of an entry and refreshes them on a schedule.
///
/// A failed cycle keeps the previous data visible and only flips
/// `last_update_success`.
pub struct Coordinator {
    name: String,
    specs: Vec<SensorSpec>,
    aggregator: Aggregator,
    update_interval: Duration,
    refresh_timeout: Duration,
    state: watch::Sender<Arc<CoordinatorState>>,
    /// Scheduled and requested cycles never overlap.
    cycle: Mutex<()>,
}

impl Coordinator {
    pub fn new(
        name: &str,
        specs: Vec<SensorSpec>,
        aggregator: Aggregator,
        update_interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(Arc::new(CoordinatorState::default()));
        Self {
            name: name.to_string(),
            specs,
            aggregator,
            update_interval,
            refresh_timeout: default_refresh_timeout(update_interval),
            state,
            cycle: Mutex::new(()),
        }
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn specs(&self) -> &[SensorSpec] {
        &self.specs
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    pub fn refresh_timeout(&self) -> Duration {
        self.refresh_timeout
    }

    /// The currently published state.
    pub fn state(&self) -> Arc<CoordinatorState> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<CoordinatorState>> {
        self.state.subscribe()
    }

    /// Run one cycle under the refresh timeout and publish the outcome.
    pub async fn refresh(&self) -> Result<(), RefreshError> {
        let _cycle = self.cycle.lock().await;
        let span = info_span!("refresh_cycle", entry = %self.name, sensors = self.specs.len());

        let cycle = self.aggregator.refresh(&self.specs);
        let outcome = tokio::time::timeout(self.refresh_timeout, cycle)
            .instrument(span)
            .await
            .unwrap_or(Err(RefreshError::Timeout(self.refresh_timeout)));

        match outcome {
            Ok(data) => {
                tracing::info!(entry = %self.name, sensors = data.len(), "refreshed recipes");
                self.state.send_replace(Arc::new(CoordinatorState {
                    data,
                    last_update_success: true,
                    last_refreshed_at: Some(Utc::now()),
                    last_error: None,
                }));
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    entry = %self.name,
                    error = %e,
                    "error communicating with recipe source"
                );
                let previous = self.state();
                self.state.send_replace(Arc::new(CoordinatorState {
                    data: previous.data.clone(),
                    last_update_success: false,
                    last_refreshed_at: previous.last_refreshed_at,
                    last_error: Some(e.to_string()),
                }));
                Err(e)
            }
        }
    }

    /// Run a cycle now, outside the schedule, and return the resulting state.
    pub async fn request_refresh(&self) -> Arc<CoordinatorState> {
        // the outcome is recorded in the published state
        let _ = self.refresh().await;
        self.state()
    }

    /// Refresh every interval until cancelled. The first scheduled cycle runs
    /// one interval after start.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + self.update_interval, self.update_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            entry = %self.name,
            interval_secs = self.update_interval.as_secs(),
            "starting refresh loop"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = self.refresh() => {}
                    }
                }
            }
        }

        tracing::info!(entry = %self.name, "refresh loop stopped");
    }
}

/// One second shorter than the interval, so a cycle ends before the next.
pub fn default_refresh_timeout(update_interval: Duration) -> Duration {
    if update_interval > Duration::from_secs(1) {
        update_interval - Duration::from_secs(1)
    } else {
        update_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::extract::RecipeDetail;
    use crate::source::{FakeSource, RecipeSource, SearchFilters};
    use crate::types::{RecipeLink, SensorType};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const HOUR: Duration = Duration::from_secs(3600);

    /// Serves a numbered recipe per call, or hangs once stalled.
    #[derive(Default)]
    struct CountingSource {
        stall: AtomicBool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RecipeSource for CountingSource {
        async fn random_recipe(&self) -> Result<Option<RecipeLink>, SourceError> {
            if self.stall.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_secs(100 * 3600)).await;
            }
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Some(RecipeLink::new(&format!("http://x/{}", n))))
        }

        async fn recipes_by_category(&self, _: &str) -> Result<Vec<RecipeLink>, SourceError> {
            Ok(Vec::new())
        }

        async fn search_recipes(
            &self,
            _: &str,
            _: &SearchFilters,
        ) -> Result<Vec<RecipeLink>, SourceError> {
            Ok(Vec::new())
        }

        async fn fetch_recipe_detail(&self, url: &str) -> Result<RecipeDetail, SourceError> {
            Ok(RecipeDetail::from_json_ld(url, json!({"name": url})))
        }
    }

    fn random_specs() -> Vec<SensorSpec> {
        vec![SensorSpec::new("random", SensorType::Random, "Random")]
    }

    #[test]
    fn timeout_is_just_under_interval() {
        assert_eq!(default_refresh_timeout(HOUR), Duration::from_secs(3599));
        assert_eq!(
            default_refresh_timeout(Duration::from_millis(500)),
            Duration::from_millis(500)
        );
    }

    #[tokio::test]
    async fn successful_refresh_publishes() {
        let source = Arc::new(
            FakeSource::new()
                .with_random("http://x/1")
                .with_recipe("http://x/1", json!({"name": "Soup"})),
        );
        let coordinator =
            Coordinator::new("chefkoch", random_specs(), Aggregator::new(source), HOUR);
        let mut rx = coordinator.subscribe();

        assert!(!coordinator.state().last_update_success);
        coordinator.refresh().await.unwrap();

        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert!(state.last_update_success);
        assert!(state.last_refreshed_at.is_some());
        assert_eq!(state.data["random"].title, "Soup");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_keeps_previous_data() {
        let source = Arc::new(CountingSource::default());
        let coordinator =
            Coordinator::new("chefkoch", random_specs(), Aggregator::new(source.clone()), HOUR);

        coordinator.refresh().await.unwrap();
        let before = coordinator.state();
        assert_eq!(before.data["random"].url, "http://x/1");

        source.stall.store(true, Ordering::SeqCst);
        let err = coordinator.refresh().await.unwrap_err();

        assert!(matches!(err, RefreshError::Timeout(t) if t == Duration::from_secs(3599)));
        let after = coordinator.state();
        assert!(!after.last_update_success);
        assert_eq!(after.data, before.data);
        assert_eq!(after.last_refreshed_at, before.last_refreshed_at);
        assert!(after.last_error.as_deref().unwrap().contains("Timeout"));
    }

    #[tokio::test(start_paused = true)]
    async fn run_refreshes_on_schedule_until_cancelled() {
        let source = Arc::new(CountingSource::default());
        let coordinator = Arc::new(Coordinator::new(
            "chefkoch",
            random_specs(),
            Aggregator::new(source.clone()),
            HOUR,
        ));
        let mut rx = coordinator.subscribe();
        let cancel = CancellationToken::new();
        let start = Instant::now();

        let handle = tokio::spawn(coordinator.clone().run(cancel.clone()));

        rx.changed().await.unwrap();
        assert!(start.elapsed() >= HOUR);
        assert_eq!(rx.borrow().data["random"].url, "http://x/1");

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().data["random"].url, "http://x/2");

        cancel.cancel();
        handle.await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn request_refresh_returns_state_even_on_failure() {
        let source = Arc::new(FakeSource::new().with_delay(Duration::from_millis(50)));
        let coordinator =
            Coordinator::new("chefkoch", random_specs(), Aggregator::new(source), HOUR)
                .with_refresh_timeout(Duration::from_millis(1));

        let state = coordinator.request_refresh().await;

        assert!(!state.last_update_success);
        assert!(state.data.is_empty());
    }
}
