//! On-demand to reserved conversion suggestions
//!
//! For each on-demand usage bucket, estimates the smallest reserved fleet
//! that could have carried the observed normalized usage over the window,
//! prices it against the fixed-profile rate card, and suggests conversion
//! when the reservation would have cost strictly less.

use serde::{Deserialize, Serialize};

use crate::models::{UsageRecord, UsageTag};
use crate::normalization::inverse_factor;
use crate::pricing::PriceTable;
use crate::report::ReportWindow;

/// Suggestions surfaced in human-facing output; telemetry sees all of them
pub const SUGGESTION_LIMIT: usize = 7;

/// One conversion recommendation for a (family, factor) usage bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionSuggestion {
    /// Resolved type: family joined with the inverse-factor size token
    pub instance_type: String,
    /// Smallest whole machine count covering the usage at full-window runtime
    pub machines: u64,
    pub on_demand_cost: f64,
    pub reserved_cost: f64,
    /// Percentage saved relative to the on-demand cost
    pub delta_percent: f64,
}

impl ConversionSuggestion {
    /// Absolute saving over the window
    pub fn saving(&self) -> f64 {
        self.on_demand_cost - self.reserved_cost
    }
}

/// Advisor result for one report window
#[derive(Debug, Clone, PartialEq)]
pub enum AdvisorOutcome {
    /// No bucket produced a positive saving
    NoViableConversion,
    /// Accepted suggestions, descending by percentage saved; never empty
    Suggestions(Vec<ConversionSuggestion>),
}

impl AdvisorOutcome {
    /// Accepted suggestions, or an empty slice when nothing is viable
    pub fn suggestions(&self) -> &[ConversionSuggestion] {
        match self {
            AdvisorOutcome::NoViableConversion => &[],
            AdvisorOutcome::Suggestions(list) => list,
        }
    }

    pub fn into_suggestions(self) -> Option<Vec<ConversionSuggestion>> {
        match self {
            AdvisorOutcome::NoViableConversion => None,
            AdvisorOutcome::Suggestions(list) => Some(list),
        }
    }
}

/// Evaluate conversion candidacy for every on-demand usage bucket
///
/// Only `Usage`-tagged buckets are candidates; discounted usage is already
/// covered by reservations. Buckets that cannot resolve (empty family, zero
/// factor, no rate-card entry) are skipped silently per the input-shape
/// error policy. A non-positive window rejects everything.
pub fn suggest_conversions(
    usage: &[UsageRecord],
    prices: &PriceTable,
    window: &ReportWindow,
) -> AdvisorOutcome {
    let window_hours = window.hours();

    let mut accepted = Vec::new();
    for bucket in usage.iter().filter(|u| u.tag == UsageTag::Usage) {
        if bucket.family.is_empty()
            || bucket.normalization_factor == 0.0
            || window_hours <= 0.0
        {
            continue;
        }

        let instance_type = format!(
            "{}.{}",
            bucket.family,
            inverse_factor(bucket.normalization_factor)
        );
        let Some(unit_price) = prices.hourly(&instance_type) else {
            continue;
        };

        // Unit-hours back to single-machine hours, then up to whole machines
        let hours_per_machine = bucket.normalized_usage / bucket.normalization_factor;
        let machines = (hours_per_machine / window_hours).ceil();
        let reserved_cost = machines * unit_price * window_hours;

        if bucket.cost - reserved_cost > 0.0 {
            accepted.push(ConversionSuggestion {
                instance_type,
                machines: machines as u64,
                on_demand_cost: bucket.cost,
                reserved_cost,
                delta_percent: 100.0 * (bucket.cost - reserved_cost) / bucket.cost,
            });
        }
    }

    if accepted.is_empty() {
        return AdvisorOutcome::NoViableConversion;
    }
    accepted.sort_by(|a, b| {
        b.delta_percent
            .partial_cmp(&a.delta_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    AdvisorOutcome::Suggestions(accepted)
}
