//! Plausible status values for when the backend is unreachable.

use chrono::{Datelike, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

use super::usage_model::{DataSource, StatusSnapshot};
use crate::plans::PlanTier;

/// Maximum relative deviation from the linear month-to-date expectation.
pub const SYNTHETIC_JITTER: f64 = 0.2;

pub(crate) fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(30)
}

/// Deterministic core of the generator. `jitter` is the drawn relative
/// deviation and is clamped to `±SYNTHETIC_JITTER`.
pub fn synthesize_status(plan: PlanTier, today: NaiveDate, jitter: f64) -> StatusSnapshot {
    let limit = f64::from(plan.limit());
    let jitter = if jitter.is_finite() {
        jitter.clamp(-SYNTHETIC_JITTER, SYNTHETIC_JITTER)
    } else {
        0.0
    };

    // floor(limit / days_in_month * day_of_month), kept in integers to stay exact.
    let expected = f64::from(plan.limit() * today.day() / days_in_month(today));
    let used = (expected + jitter * expected).round().clamp(0.0, limit);
    let percent = (used / limit * 100.0).floor().clamp(0.0, 100.0);

    StatusSnapshot {
        plan_name: plan.as_str().to_string(),
        plan_limit: plan.limit(),
        month_used: used,
        progress_percent: percent,
        predicted_units: None,
        reward_points: None,
        source: DataSource::Synthetic,
        fetched_at: Utc::now(),
    }
}

/// Draws jitter from an owned RNG; seed it for reproducible output.
#[derive(Debug)]
pub struct SyntheticDataGenerator {
    rng: Mutex<StdRng>,
}

impl SyntheticDataGenerator {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn generate(&self, plan: PlanTier, today: NaiveDate) -> StatusSnapshot {
        let jitter = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            rng.gen_range(-SYNTHETIC_JITTER..=SYNTHETIC_JITTER)
        };
        synthesize_status(plan, today, jitter)
    }
}

impl Default for SyntheticDataGenerator {
    fn default() -> Self {
        Self::new()
    }
}
