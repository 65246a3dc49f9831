//! Coach suggestions, advanced prediction, server alerts and rewards.

use log::warn;
use std::sync::Arc;

use super::app_state::{AppState, Insights, ReadSection, UsagePrediction};
use super::events::{DashboardEvent, DashboardEventSink};
use crate::backend::{BackendResult, UsageBackend};
use crate::usage::{DataSource, StatusSnapshot};

/// Rule-based suggestion used when the coach endpoint is unavailable.
pub fn local_coach_suggestion(progress_percent: f64) -> &'static str {
    if progress_percent < 50.0 {
        "Good job! You are consuming efficiently. Keep going!"
    } else if progress_percent < 80.0 {
        "Usage is increasing. Try turning off unnecessary fans & lights."
    } else if progress_percent < 100.0 {
        "You are close to your plan limit. Reduce consumption in peak hours (6-9 PM)."
    } else {
        "You exceeded your plan. Consider upgrading to a higher plan next month."
    }
}

pub struct InsightsCollector {
    backend: Arc<dyn UsageBackend>,
    state: Arc<AppState>,
    event_sink: Arc<dyn DashboardEventSink>,
}

impl InsightsCollector {
    pub fn new(
        backend: Arc<dyn UsageBackend>,
        state: Arc<AppState>,
        event_sink: Arc<dyn DashboardEventSink>,
    ) -> Self {
        Self {
            backend,
            state,
            event_sink,
        }
    }

    /// Unwraps one insight read, flagging its section while it falls back.
    fn settle<T>(&self, section: ReadSection, result: BackendResult<T>) -> Option<T> {
        match result {
            Ok(value) => {
                self.state.clear_fallback(section);
                Some(value)
            }
            Err(err) => {
                warn!("[Sync] {:?} unavailable: {}", section, err);
                if self.state.mark_fallback(section) {
                    self.event_sink.emit(DashboardEvent::FallbackData {
                        section,
                        reason: err.to_string(),
                    });
                }
                None
            }
        }
    }

    /// Fetches all four insight endpoints concurrently and publishes the result.
    pub async fn collect(&self, user_id: &str, snapshot: &StatusSnapshot) -> Insights {
        let (coach, prediction, alerts, rewards) = tokio::join!(
            self.backend.get_coach(user_id),
            self.backend.get_prediction(user_id),
            self.backend.get_alerts(user_id),
            self.backend.get_rewards(user_id),
        );

        let coach = self.settle(ReadSection::Coach, coach);
        let prediction = self.settle(ReadSection::Prediction, prediction);
        let alerts = self.settle(ReadSection::Alerts, alerts);
        let rewards = self.settle(ReadSection::Rewards, rewards);
        let degraded =
            coach.is_none() || prediction.is_none() || alerts.is_none() || rewards.is_none();

        let suggestions = coach.map(|coach| coach.suggestions).unwrap_or_else(|| {
            vec![local_coach_suggestion(snapshot.progress_percent).to_string()]
        });
        let prediction = prediction
            .filter(|p| p.prediction.is_finite())
            .map(|p| UsagePrediction {
                units: p.prediction.max(0.0),
                trend: p.trend,
            });
        let server_alerts = alerts.map(|a| a.alerts).unwrap_or_default();
        let reward_points = rewards
            .filter(|r| r.reward_points.is_finite())
            .map(|r| r.reward_points.max(0.0).round() as u32);

        let insights = Insights {
            suggestions,
            prediction,
            server_alerts,
            reward_points,
            source: if degraded {
                DataSource::Synthetic
            } else {
                DataSource::Server
            },
        };
        self.state.replace_insights(insights.clone());
        insights
    }
}
