//! Reserved-instance rate card
//!
//! All conversion estimates use one fixed purchase profile (US East,
//! one-year standard term, all-upfront payment, Linux, shared tenancy) so
//! suggestions across accounts are comparable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mean hours in a year, accounting for leap years
pub const HOURS_PER_YEAR: f64 = 8765.81256;

/// Mean hours in a month
pub const HOURS_PER_MONTH: f64 = 730.48438;

/// Purchase profile identifying one rate card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingProfile {
    pub region: String,
    pub term: String,
    pub offering_class: String,
    pub payment_option: String,
}

impl Default for PricingProfile {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            term: "1yr".to_string(),
            offering_class: "standard".to_string(),
            payment_option: "all-upfront".to_string(),
        }
    }
}

/// Hourly reserved unit prices keyed by instance type
///
/// The table is the fully-paginated result of a provider pricing fetch;
/// pagination mechanics live with the source, not here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceTable {
    prices: BTreeMap<String, f64>,
}

impl PriceTable {
    pub fn new(prices: BTreeMap<String, f64>) -> Self {
        Self { prices }
    }

    /// Hourly unit price for an instance type, if the rate card has one
    pub fn hourly(&self, instance_type: &str) -> Option<f64> {
        self.prices.get(instance_type).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Convert an all-upfront fee into its equivalent hourly rate
    pub fn hourly_from_upfront(upfront_fee: f64) -> f64 {
        upfront_fee / HOURS_PER_YEAR
    }
}

impl FromIterator<(String, f64)> for PriceTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            prices: iter.into_iter().collect(),
        }
    }
}
