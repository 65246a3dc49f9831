//! Plan-tier recommendation from predicted usage.

use log::debug;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Mutex;

use crate::plans::PlanTier;

/// Smallest tier whose limit covers `predicted_units`; Premium otherwise.
pub fn tier_for_units(predicted_units: f64) -> PlanTier {
    PlanTier::ALL
        .into_iter()
        .find(|tier| predicted_units <= f64::from(tier.limit()))
        .unwrap_or(PlanTier::Premium)
}

/// Returns a tier only when the prediction exceeds the current limit.
pub fn recommend(predicted_units: f64, current_limit: u32) -> Option<PlanTier> {
    if !predicted_units.is_finite() || predicted_units <= f64::from(current_limit) {
        return None;
    }
    Some(tier_for_units(predicted_units))
}

/// A suggested plan change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub plan: PlanTier,
    pub plan_units: u32,
    pub plan_price: Decimal,
    pub predicted_units: f64,
    /// Monthly price difference versus the current plan, when known.
    pub savings_estimate: Option<Decimal>,
}

impl Recommendation {
    fn new(plan: PlanTier, predicted_units: f64, current_plan: Option<PlanTier>) -> Self {
        Self {
            plan,
            plan_units: plan.limit(),
            plan_price: plan.price(),
            predicted_units: (predicted_units * 10.0).round() / 10.0,
            savings_estimate: current_plan.map(|current| current.price() - plan.price()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationOutcome {
    /// Prediction fits the current limit, or no prediction is available.
    None,
    /// First time this `(predicted, limit)` pair asks for an upgrade.
    New(Recommendation),
    /// The same pair is already on screen.
    AlreadyDisplayed(Recommendation),
}

impl RecommendationOutcome {
    pub fn recommendation(&self) -> Option<&Recommendation> {
        match self {
            Self::None => None,
            Self::New(rec) | Self::AlreadyDisplayed(rec) => Some(rec),
        }
    }
}

/// Remembers the pair currently displayed so refresh cycles don't re-prompt.
#[derive(Debug, Default)]
pub struct RecommendationEngine {
    displayed: Mutex<Option<(u64, u32)>>,
}

impl RecommendationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(
        &self,
        predicted_units: Option<f64>,
        current_limit: u32,
        current_plan: Option<PlanTier>,
    ) -> RecommendationOutcome {
        let mut displayed = self
            .displayed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let Some(predicted) = predicted_units else {
            *displayed = None;
            return RecommendationOutcome::None;
        };
        let Some(plan) = recommend(predicted, current_limit) else {
            *displayed = None;
            return RecommendationOutcome::None;
        };

        let recommendation = Recommendation::new(plan, predicted, current_plan);
        let key = (predicted.to_bits(), current_limit);
        if *displayed == Some(key) {
            return RecommendationOutcome::AlreadyDisplayed(recommendation);
        }

        debug!(
            "[Sync] Recommending {} (predicted={} limit={})",
            plan, predicted, current_limit
        );
        *displayed = Some(key);
        RecommendationOutcome::New(recommendation)
    }
}
