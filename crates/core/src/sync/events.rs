//! User-visible notifications emitted by the refresh pipeline.

use serde::Serialize;

use super::app_state::ReadSection;
use crate::notifications::Alert;
use crate::recommendation::Recommendation;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardEvent {
    /// Usage crossed a notification band. At most one per cycle.
    Alert(Alert),
    /// A new `(predicted, limit)` pair calls for a larger plan.
    UpgradeSuggested(Recommendation),
    /// Reads started failing; synthetic data is being shown.
    Degraded { reason: String },
    /// Reads succeed again after a degraded period.
    Recovered,
    /// Low severity: a secondary read failed and `section` now shows demo or
    /// local data. Sent when the section starts falling back.
    FallbackData { section: ReadSection, reason: String },
}

/// Receives dashboard events. Hosts bridge this to their UI transport.
pub trait DashboardEventSink: Send + Sync {
    fn emit(&self, event: DashboardEvent);
}

/// Default sink that discards events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpDashboardEventSink;

impl DashboardEventSink for NoOpDashboardEventSink {
    fn emit(&self, _event: DashboardEvent) {}
}
