//! Reconciled usage models.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::StatusResponse;
use crate::plans::PlanTier;

/// Number of days covered by a [`UsageSeries`].
pub const USAGE_WINDOW_DAYS: usize = 7;

/// Fixed weekday series shown when history cannot be fetched at all.
pub const DEMO_USAGE_SERIES: [(&str, f64); USAGE_WINDOW_DAYS] = [
    ("Mon", 12.0),
    ("Tue", 19.0),
    ("Wed", 8.0),
    ("Thu", 15.0),
    ("Fri", 10.0),
    ("Sat", 6.0),
    ("Sun", 9.0),
];

/// Origin of reconciled data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Server,
    Synthetic,
}

/// Account status for one reconciliation cycle. Always replaced as a whole.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub plan_name: String,
    pub plan_limit: u32,
    pub month_used: f64,
    /// Clamped to `[0, 100]`.
    pub progress_percent: f64,
    pub predicted_units: Option<f64>,
    pub reward_points: Option<u32>,
    pub source: DataSource,
    pub fetched_at: DateTime<Utc>,
}

fn non_negative(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite()).map(|v| v.max(0.0))
}

pub(crate) fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

impl StatusSnapshot {
    /// Builds a server-sourced snapshot, filling gaps from the locally selected plan.
    pub fn from_server(response: StatusResponse, fallback_plan: PlanTier) -> Self {
        let plan_name = response
            .plan_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| fallback_plan.as_str().to_string());
        let plan_limit = non_negative(response.plan_limit)
            .map(|limit| limit.round() as u32)
            .unwrap_or_else(|| fallback_plan.limit());
        let month_used = non_negative(response.month_used).unwrap_or(0.0);
        let progress_percent = match response.progress_percent {
            Some(percent) => clamp_percent(percent),
            None if plan_limit > 0 => clamp_percent(month_used / f64::from(plan_limit) * 100.0),
            None => 0.0,
        };

        Self {
            plan_name,
            plan_limit,
            month_used,
            progress_percent,
            predicted_units: non_negative(response.predicted_units),
            reward_points: non_negative(response.reward_points).map(|p| p.round() as u32),
            source: DataSource::Server,
            fetched_at: Utc::now(),
        }
    }
}

/// One charted day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsagePoint {
    pub label: String,
    /// `None` for the weekday-labelled demo series.
    pub date: Option<NaiveDate>,
    pub units: f64,
}

/// Exactly [`USAGE_WINDOW_DAYS`] points, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSeries {
    points: [UsagePoint; USAGE_WINDOW_DAYS],
    source: DataSource,
}

impl UsageSeries {
    /// Builds the window ending at `today`, asking `units_for` for each day.
    /// Negative or non-finite values become 0.
    pub fn for_window_ending(today: NaiveDate, units_for: impl Fn(NaiveDate) -> f64) -> Self {
        let points = std::array::from_fn(|idx| {
            let offset = (USAGE_WINDOW_DAYS - 1 - idx) as i64;
            let date = today - Duration::days(offset);
            let units = units_for(date);
            UsagePoint {
                label: date.format("%Y-%m-%d").to_string(),
                date: Some(date),
                units: if units.is_finite() { units.max(0.0) } else { 0.0 },
            }
        });
        Self {
            points,
            source: DataSource::Server,
        }
    }

    /// The documented fallback series.
    pub fn demo() -> Self {
        let points = DEMO_USAGE_SERIES.map(|(label, units)| UsagePoint {
            label: label.to_string(),
            date: None,
            units,
        });
        Self {
            points,
            source: DataSource::Synthetic,
        }
    }

    pub fn points(&self) -> &[UsagePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    pub fn total_units(&self) -> f64 {
        self.points.iter().map(|p| p.units).sum()
    }
}

impl Default for UsageSeries {
    fn default() -> Self {
        Self::demo()
    }
}
