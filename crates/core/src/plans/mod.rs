//! Subscription plan catalog.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::Error;

/// The three subscription tiers, ordered from smallest to largest.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum PlanTier {
    #[default]
    Basic,
    Standard,
    Premium,
}

/// Limit and monthly price of a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSpec {
    pub tier: PlanTier,
    pub limit: u32,
    pub price: Decimal,
}

/// Read-only catalog, smallest tier first.
pub const PLAN_CATALOG: [PlanSpec; 3] = [
    PlanSpec {
        tier: PlanTier::Basic,
        limit: 100,
        price: dec!(199),
    },
    PlanSpec {
        tier: PlanTier::Standard,
        limit: 200,
        price: dec!(399),
    },
    PlanSpec {
        tier: PlanTier::Premium,
        limit: 400,
        price: dec!(699),
    },
];

impl PlanTier {
    pub const ALL: [PlanTier; 3] = [PlanTier::Basic, PlanTier::Standard, PlanTier::Premium];

    pub fn spec(self) -> PlanSpec {
        PLAN_CATALOG[self as usize]
    }

    pub fn limit(self) -> u32 {
        self.spec().limit
    }

    pub fn price(self) -> Decimal {
        self.spec().price
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlanTier::Basic => "Basic",
            PlanTier::Standard => "Standard",
            PlanTier::Premium => "Premium",
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        PlanTier::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| Error::validation(format!("Unknown plan '{}'", value)))
    }
}
