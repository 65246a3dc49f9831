//! Fixed-length recent usage series for charting.

use chrono::NaiveDate;
use log::warn;
use serde_json::Value;
use std::sync::Arc;

use super::app_state::{AppState, ReadSection};
use super::events::{DashboardEvent, DashboardEventSink};
use crate::backend::UsageBackend;
use crate::usage::UsageSeries;

/// Coerces one history record to units. Accepts a number, a numeric string,
/// or a `{ "units": .. }` record; anything else counts as 0.
pub fn coerce_units(value: &Value) -> f64 {
    let units = match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => text.trim().parse::<f64>().unwrap_or(0.0),
        Value::Object(record) => record.get("units").map(coerce_units).unwrap_or(0.0),
        _ => 0.0,
    };
    if units.is_finite() {
        units
    } else {
        0.0
    }
}

pub struct UsageHistoryAggregator {
    backend: Arc<dyn UsageBackend>,
    state: Arc<AppState>,
    event_sink: Arc<dyn DashboardEventSink>,
}

impl UsageHistoryAggregator {
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

    /// Returns the seven days ending at `today` and publishes them.
    ///
    /// Days the backend doesn't report are 0. If the fetch itself fails the
    /// fixed demo series is used so the chart is never empty, and the chart is
    /// flagged as demo data.
    pub async fn fetch_history(&self, user_id: &str, today: NaiveDate) -> UsageSeries {
        let series = match self.backend.get_usage_history(user_id).await {
            Ok(response) => {
                self.state.clear_fallback(ReadSection::History);
                UsageSeries::for_window_ending(today, |date| {
                    response
                        .history
                        .get(&date.format("%Y-%m-%d").to_string())
                        .map(coerce_units)
                        .unwrap_or(0.0)
                })
            }
            Err(err) => {
                warn!(
                    "[Sync] Usage history fetch failed for {}, using demo series: {}",
                    user_id, err
                );
                if self.state.mark_fallback(ReadSection::History) {
                    self.event_sink.emit(DashboardEvent::FallbackData {
                        section: ReadSection::History,
                        reason: err.to_string(),
                    });
                }
                UsageSeries::demo()
            }
        };

        self.state.replace_history(series.clone());
        series
    }
}
