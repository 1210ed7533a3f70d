//! Subscription plans.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Currency, Price};

/// A purchasable plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Monthly,
    Annual,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown plan: {0}")]
pub struct UnknownPlan(pub String);

impl Plan {
    pub const ALL: [Self; 2] = [Self::Monthly, Self::Annual];

    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Annual => "annual",
        }
    }

    /// Nominal amount billed per period. The same figure is used in every
    /// currency.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        match self {
            Self::Monthly => Decimal::from_parts(60, 0, 0, false, 0),
            Self::Annual => Decimal::from_parts(648, 0, 0, false, 0),
        }
    }

    /// Savings against twelve months of the monthly plan.
    #[must_use]
    pub fn savings(self) -> Option<Decimal> {
        match self {
            Self::Monthly => None,
            Self::Annual => Some(Self::Monthly.amount() * Decimal::from(12) - self.amount()),
        }
    }

    #[must_use]
    pub const fn is_popular(self) -> bool {
        matches!(self, Self::Annual)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Plan {
    type Err = UnknownPlan;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "annual" | "yearly" => Ok(Self::Annual),
            other => Err(UnknownPlan(other.to_owned())),
        }
    }
}

/// A plan as shown on the pricing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanOffer {
    pub plan: Plan,
    pub price: Price,
    pub display_price: String,
    pub savings: Option<Price>,
    pub popular: bool,
    pub checkout_path: String,
}

impl PlanOffer {
    #[must_use]
    pub fn new(plan: Plan, currency: Currency) -> Self {
        let price = Price::new(plan.amount(), currency);
        Self {
            plan,
            display_price: price.display(),
            price,
            savings: plan.savings().map(|s| Price::new(s, currency)),
            popular: plan.is_popular(),
            checkout_path: format!("/pricing/checkout/{}?currency={}", plan.slug(), currency.code()),
        }
    }
}

/// Every plan in `currency`, in display order.
#[must_use]
pub fn catalog(currency: Currency) -> Vec<PlanOffer> {
    Plan::ALL
        .into_iter()
        .map(|plan| PlanOffer::new(plan, currency))
        .collect()
}
