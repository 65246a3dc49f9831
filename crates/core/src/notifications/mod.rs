//! Usage notification bands.

use serde::{Deserialize, Serialize};

use crate::usage::StatusSnapshot;

pub const WARNING_THRESHOLD_PERCENT: f64 = 80.0;
pub const CRITICAL_THRESHOLD_PERCENT: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Normal,
    Warning,
    Critical,
}

/// Classifies progress: `< 80` normal, `[80, 100)` warning, `>= 100` critical.
///
/// Negative and `NaN` inputs classify as normal, so a malformed reading never
/// raises an alert. Infinity is critical.
pub fn classify(progress_percent: f64) -> Band {
    if progress_percent >= CRITICAL_THRESHOLD_PERCENT {
        Band::Critical
    } else if progress_percent >= WARNING_THRESHOLD_PERCENT {
        Band::Warning
    } else {
        Band::Normal
    }
}

/// Transient per-cycle alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub band: Band,
    pub message: String,
}

/// Stateless: the alert is derived from the current snapshot only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationThrottler;

impl NotificationThrottler {
    /// One alert for warning/critical, none for normal.
    pub fn alert_for(&self, snapshot: &StatusSnapshot) -> Option<Alert> {
        let band = classify(snapshot.progress_percent);
        let message = match band {
            Band::Normal => return None,
            Band::Warning => format!(
                "80% of your {} plan limit reached ({:.0} of {} units)",
                snapshot.plan_name, snapshot.month_used, snapshot.plan_limit
            ),
            Band::Critical => format!(
                "100% of your {} plan limit reached ({:.0} of {} units)",
                snapshot.plan_name, snapshot.month_used, snapshot.plan_limit
            ),
        };
        Some(Alert { band, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plans::PlanTier;
    use crate::usage::synthesize_status;
    use chrono::NaiveDate;

    #[test]
    fn band_boundaries() {
        assert_eq!(classify(0.0), Band::Normal);
        assert_eq!(classify(79.9), Band::Normal);
        assert_eq!(classify(80.0), Band::Warning);
        assert_eq!(classify(99.99), Band::Warning);
        assert_eq!(classify(100.0), Band::Critical);
    }

    #[test]
    fn malformed_percentages() {
        assert_eq!(classify(f64::NAN), Band::Normal);
        assert_eq!(classify(-5.0), Band::Normal);
        assert_eq!(classify(f64::NEG_INFINITY), Band::Normal);
        assert_eq!(classify(f64::INFINITY), Band::Critical);

        let mut snapshot =
            synthesize_status(PlanTier::Basic, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), 0.0);
        snapshot.progress_percent = f64::NAN;
        assert_eq!(NotificationThrottler.alert_for(&snapshot), None);
    }

    #[test]
    fn normal_band_emits_no_alert() {
        let mut snapshot =
            synthesize_status(PlanTier::Basic, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), 0.0);
        snapshot.progress_percent = 42.0;
        assert_eq!(NotificationThrottler.alert_for(&snapshot), None);

        snapshot.progress_percent = 100.0;
        let alert = NotificationThrottler.alert_for(&snapshot).expect("alert");
        assert_eq!(alert.band, Band::Critical);
        assert!(alert.message.starts_with("100%"));
    }
}
