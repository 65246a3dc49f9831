//! One reconciliation cycle: status, history, recommendation, notification.

use chrono::{Local, Utc};
use log::debug;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use super::app_state::AppState;
use super::events::{DashboardEvent, DashboardEventSink, NoOpDashboardEventSink};
use super::history_aggregator::UsageHistoryAggregator;
use super::insights::InsightsCollector;
use super::status_synchronizer::StatusSynchronizer;
use super::sync_config::SyncConfig;
use crate::backend::UsageBackend;
use crate::notifications::{classify, Band, NotificationThrottler};
use crate::plans::PlanTier;
use crate::recommendation::{RecommendationEngine, RecommendationOutcome};
use crate::usage::{DataSource, SyntheticDataGenerator};

/// Summary of a finished cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleResult {
    pub status_source: DataSource,
    pub history_source: DataSource,
    pub band: Band,
    pub recommended_plan: Option<PlanTier>,
    pub alerted: bool,
    pub duration_ms: i64,
}

pub struct RefreshPipeline {
    state: Arc<AppState>,
    status: StatusSynchronizer,
    history: UsageHistoryAggregator,
    recommendations: RecommendationEngine,
    throttler: NotificationThrottler,
    insights: Option<InsightsCollector>,
    event_sink: Arc<dyn DashboardEventSink>,
}

impl RefreshPipeline {
    pub fn new(backend: Arc<dyn UsageBackend>, state: Arc<AppState>, config: &SyncConfig) -> Self {
        Self::with_parts(
            backend,
            state,
            config,
            Arc::new(SyntheticDataGenerator::new()),
            Arc::new(NoOpDashboardEventSink),
        )
    }

    pub fn with_parts(
        backend: Arc<dyn UsageBackend>,
        state: Arc<AppState>,
        config: &SyncConfig,
        generator: Arc<SyntheticDataGenerator>,
        event_sink: Arc<dyn DashboardEventSink>,
    ) -> Self {
        Self {
            status: StatusSynchronizer::new(
                Arc::clone(&backend),
                Arc::clone(&state),
                generator,
                Arc::clone(&event_sink),
            ),
            history: UsageHistoryAggregator::new(
                Arc::clone(&backend),
                Arc::clone(&state),
                Arc::clone(&event_sink),
            ),
            insights: config.insights_enabled.then(|| {
                InsightsCollector::new(
                    Arc::clone(&backend),
                    Arc::clone(&state),
                    Arc::clone(&event_sink),
                )
            }),
            recommendations: RecommendationEngine::new(),
            throttler: NotificationThrottler,
            state,
            event_sink,
        }
    }

    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Runs every step in order. Status is always published before the
    /// recommendation and alert are derived from it. Never fails.
    pub async fn run_cycle(&self) -> CycleResult {
        let started_at = Instant::now();
        let user_id = self.state.account().user_id().to_string();

        let snapshot = self.status.fetch_status(&user_id).await;
        let history = self
            .history
            .fetch_history(&user_id, Local::now().date_naive())
            .await;

        // Re-read: the status step may have converged the plan.
        let account = self.state.account();
        let outcome = self.recommendations.evaluate(
            snapshot.predicted_units,
            account.plan_limit(),
            Some(account.selected_plan()),
        );
        self.state
            .replace_recommendation(outcome.recommendation().cloned());
        let recommended_plan = outcome.recommendation().map(|rec| rec.plan);
        if let RecommendationOutcome::New(recommendation) = outcome {
            self.event_sink
                .emit(DashboardEvent::UpgradeSuggested(recommendation));
        }

        let alert = self.throttler.alert_for(&snapshot);
        self.state.replace_alert(alert.clone());
        let alerted = alert.is_some();
        if let Some(alert) = alert {
            self.event_sink.emit(DashboardEvent::Alert(alert));
        }

        if let Some(insights) = &self.insights {
            insights.collect(&user_id, &snapshot).await;
        }

        self.state.finish_cycle(Utc::now());

        let result = CycleResult {
            status_source: snapshot.source,
            history_source: history.source(),
            band: classify(snapshot.progress_percent),
            recommended_plan,
            alerted,
            duration_ms: started_at.elapsed().as_millis() as i64,
        };
        debug!(
            "[Sync] Cycle complete status={:?} history={:?} band={:?} duration_ms={}",
            result.status_source, result.history_source, result.band, result.duration_ms
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StatusResponse;
    use crate::sync::testing::*;
    use crate::usage::UsageSeries;
    use std::time::Duration;

    fn config(insights_enabled: bool) -> SyncConfig {
        SyncConfig {
            insights_enabled,
            ..SyncConfig::default()
        }
    }

    fn status(percent: f64, predicted: f64) -> StatusResponse {
        StatusResponse {
            plan_name: Some("Standard".to_string()),
            plan_limit: Some(200.0),
            month_used: Some(percent * 2.0),
            progress_percent: Some(percent),
            predicted_units: Some(predicted),
            reward_points: None,
        }
    }

    #[tokio::test]
    async fn offline_cycle_uses_synthetic_status_and_demo_history() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.fail(STATUS);
        backend.fail(HISTORY);
        let state = test_state(PlanTier::Basic);
        let pipeline = RefreshPipeline::new(backend, state.clone(), &config(false));

        let result = pipeline.run_cycle().await;
        assert_eq!(result.status_source, DataSource::Synthetic);
        assert_eq!(result.recommended_plan, None);

        let view = state.view();
        assert_eq!(
            view.status.map(|s| s.source),
            Some(DataSource::Synthetic)
        );
        assert_eq!(view.history, UsageSeries::demo());
        assert!(matches!(
            view.connection,
            crate::sync::ConnectionStatus::Degraded { .. }
        ));
        assert_eq!(view.cycle_count, 1);
    }

    #[tokio::test]
    async fn cycle_emits_one_alert_and_one_upgrade_prompt_per_pair() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.set_status(status(85.0, 250.0));
        let state = test_state(PlanTier::Standard);
        let (sink, events) = recording_sink();
        let pipeline = RefreshPipeline::with_parts(
            backend,
            state.clone(),
            &config(false),
            Arc::new(SyntheticDataGenerator::seeded(3)),
            sink,
        );

        let first = pipeline.run_cycle().await;
        assert_eq!(first.band, Band::Warning);
        assert_eq!(first.recommended_plan, Some(PlanTier::Premium));
        let second = pipeline.run_cycle().await;
        assert_eq!(second.recommended_plan, Some(PlanTier::Premium));

        let events = events.lock().unwrap();
        let alerts = events
            .iter()
            .filter(|e| matches!(e, DashboardEvent::Alert(_)))
            .count();
        let prompts = events
            .iter()
            .filter(|e| matches!(e, DashboardEvent::UpgradeSuggested(_)))
            .count();
        assert_eq!(alerts, 2);
        assert_eq!(prompts, 1);
        assert!(state.view().recommendation.is_some());
    }

    #[tokio::test]
    async fn failed_history_with_live_status_is_flagged() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.set_status(status(20.0, 0.0));
        backend.fail(HISTORY);
        let state = test_state(PlanTier::Standard);
        let (sink, events) = recording_sink();
        let pipeline = RefreshPipeline::with_parts(
            backend,
            state.clone(),
            &config(false),
            Arc::new(SyntheticDataGenerator::seeded(3)),
            sink,
        );

        let result = pipeline.run_cycle().await;
        assert_eq!(result.status_source, DataSource::Server);
        assert_eq!(result.history_source, DataSource::Synthetic);

        let view = state.view();
        assert_eq!(view.connection, crate::sync::ConnectionStatus::Online);
        assert!(view
            .fallback_sections
            .contains(&crate::sync::ReadSection::History));
        assert!(events.lock().unwrap().iter().any(|e| matches!(
            e,
            DashboardEvent::FallbackData {
                section: crate::sync::ReadSection::History,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn normal_band_clears_previous_alert() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.set_status(status(120.0, 0.0));
        let state = test_state(PlanTier::Standard);
        let pipeline = RefreshPipeline::new(backend.clone(), state.clone(), &config(false));

        pipeline.run_cycle().await;
        assert_eq!(state.view().alert.map(|a| a.band), Some(Band::Critical));

        backend.set_status(status(10.0, 0.0));
        pipeline.run_cycle().await;
        assert_eq!(state.view().alert, None);
    }

    #[tokio::test]
    async fn insights_step_runs_when_enabled() {
        let backend = Arc::new(ScriptedBackend::new());
        let pipeline =
            RefreshPipeline::new(backend.clone(), test_state(PlanTier::Basic), &config(true));

        pipeline.run_cycle().await;
        assert_eq!(backend.calls(COACH), 1);
        assert_eq!(backend.calls(PREDICT), 1);
        assert_eq!(backend.calls(ALERTS), 1);
        assert_eq!(backend.calls(REWARDS), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn later_resolving_cycle_wins() {
        let backend = Arc::new(ScriptedBackend::new());
        let state = test_state(PlanTier::Standard);
        let pipeline = Arc::new(RefreshPipeline::new(
            backend.clone(),
            state.clone(),
            &config(false),
        ));

        // Slow cycle N reads 90%; fast cycle N+1 reads 10% and resolves first.
        backend.set_status(status(90.0, 0.0));
        backend.delay(STATUS, Duration::from_secs(5));
        let slow = tokio::spawn({
            let pipeline = Arc::clone(&pipeline);
            async move { pipeline.run_cycle().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        backend.set_status(status(10.0, 0.0));
        backend.delay(STATUS, Duration::ZERO);
        pipeline.run_cycle().await;
        assert_eq!(state.view().status.map(|s| s.progress_percent), Some(10.0));

        slow.await.unwrap();
        let view = state.view();
        assert_eq!(view.status.map(|s| s.progress_percent), Some(90.0));
        assert_eq!(view.alert.map(|a| a.band), Some(Band::Warning));
        assert_eq!(view.cycle_count, 2);
    }
}
