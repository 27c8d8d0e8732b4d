//! Report assembly and storage
//!
//! `assemble` merges the analysis outputs for one account and window into a
//! single serializable summary. Assembly is a read-only merge: every
//! sub-computation runs over the same input snapshot and none mutates
//! another's output.

mod store;
mod window;

pub use store::{ReportIndexEntry, ReportStore};
pub use window::{Cadence, ReportWindow, MEAN_MONTH_DAYS};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{
    aggregate_low_used, cpu_histogram, family_power_distribution, suggest_conversions,
    summarize_reservations, summarize_storage, usage_proportions, ConversionSuggestion,
    FamilyShare, Histogram, LowUsageReport, LowUsageThresholds, ReservationSummary,
    StorageSummary, UsageProportions, DEFAULT_HISTOGRAM_BUCKETS,
};
use crate::models::{
    BucketUsageRecord, InstanceUtilizationRecord, ReservedInstanceRecord, ResourceKind,
    UsageRecord,
};
use crate::pricing::PriceTable;

/// Raw instance and cost totals for one AWS product
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ProductTotals {
    pub count: u64,
    pub cost: f64,
}

/// Per-product raw totals carried alongside the derived sections
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReportTotals {
    pub ec2: ProductTotals,
    pub rds: ProductTotals,
    pub s3: ProductTotals,
}

/// Fully-resolved inputs for one account's report
///
/// Everything here is an in-memory snapshot; fetching and its error
/// handling happen before assembly is invoked.
#[derive(Debug, Clone)]
pub struct ReportInputs {
    pub account: String,
    pub window: ReportWindow,
    pub reservations: Vec<ReservedInstanceRecord>,
    pub usage: Vec<UsageRecord>,
    pub instances: Vec<InstanceUtilizationRecord>,
    pub storage: Vec<BucketUsageRecord>,
    pub prices: PriceTable,
}

/// Tunable policy knobs for assembly
#[derive(Debug, Clone, Copy)]
pub struct AssemblyOptions {
    pub histogram_buckets: usize,
    pub thresholds: LowUsageThresholds,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            histogram_buckets: DEFAULT_HISTOGRAM_BUCKETS,
            thresholds: LowUsageThresholds::default(),
        }
    }
}

/// The assembled cost-optimization report for one account and window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub account: String,
    pub window: ReportWindow,
    pub generated_at: DateTime<Utc>,
    pub reservations: ReservationSummary,
    pub low_used_ec2: LowUsageReport,
    pub low_used_rds: LowUsageReport,
    /// Accepted conversion suggestions, descending by percentage saved;
    /// `None` is the explicit "no viable conversion" signal
    pub suggestions: Option<Vec<ConversionSuggestion>>,
    /// CPU-average distribution across EC2 instances; `None` without data
    pub cpu_histogram: Option<Histogram>,
    pub proportions: UsageProportions,
    /// Per-family share of computational power, descending
    pub family_power: Vec<FamilyShare>,
    pub storage: StorageSummary,
    pub totals: ReportTotals,
}

impl ReportSummary {
    /// Total saving across all accepted suggestions
    pub fn potential_saving(&self) -> f64 {
        self.suggestions
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .map(|s| s.saving())
            .sum()
    }

    /// Low-used instance count across both kinds
    pub fn low_used_total(&self) -> u64 {
        self.low_used_ec2.low_used_instances + self.low_used_rds.low_used_instances
    }
}

/// Run every analysis over one input snapshot and merge the outputs
pub fn assemble(inputs: &ReportInputs, options: &AssemblyOptions) -> ReportSummary {
    let reservations = summarize_reservations(&inputs.reservations, &inputs.window);
    let low_used_ec2 =
        aggregate_low_used(&inputs.instances, ResourceKind::Ec2, &options.thresholds);
    let low_used_rds =
        aggregate_low_used(&inputs.instances, ResourceKind::Rds, &options.thresholds);
    let suggestions =
        suggest_conversions(&inputs.usage, &inputs.prices, &inputs.window).into_suggestions();
    let histogram = cpu_histogram(&inputs.instances, options.histogram_buckets);
    let proportions = usage_proportions(&inputs.usage);
    let family_power = family_power_distribution(&inputs.instances, &inputs.reservations);
    let storage = summarize_storage(&inputs.storage, &inputs.window);
    let totals = product_totals(inputs, &storage);

    ReportSummary {
        account: inputs.account.clone(),
        window: inputs.window,
        generated_at: Utc::now(),
        reservations,
        low_used_ec2,
        low_used_rds,
        suggestions,
        cpu_histogram: histogram,
        proportions,
        family_power,
        storage,
        totals,
    }
}

fn product_totals(inputs: &ReportInputs, storage: &StorageSummary) -> ReportTotals {
    let mut totals = ReportTotals::default();
    for record in &inputs.instances {
        let slot = match record.kind {
            ResourceKind::Ec2 => &mut totals.ec2,
            ResourceKind::Rds => &mut totals.rds,
        };
        slot.count += 1;
        slot.cost += record.total_cost();
    }
    totals.s3 = ProductTotals {
        count: storage.bucket_count,
        cost: storage.total_cost,
    };
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CpuStats, UsageTag, PRODUCT_EC2};
    use chrono::{Duration, TimeZone};
    use std::collections::BTreeMap;

    fn inputs() -> ReportInputs {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let window = ReportWindow {
            cadence: Cadence::Monthly,
            start,
            end: start + Duration::hours(730),
        };

        let mut costs = BTreeMap::new();
        costs.insert("instance".to_string(), 120.0);
        let instance = InstanceUtilizationRecord {
            id: "i-1".to_string(),
            name: "idle-worker".to_string(),
            kind: ResourceKind::Ec2,
            instance_type: "m5.large".to_string(),
            family: "m5".to_string(),
            normalization_factor: 4.0,
            region: "us-east-1".to_string(),
            costs,
            cpu: CpuStats { average: 4.0, peak: 30.0 },
            network: None,
            free_space: None,
        };

        ReportInputs {
            account: "123456789012".to_string(),
            window,
            reservations: vec![ReservedInstanceRecord {
                id: "ri-1".to_string(),
                instance_type: "m5.xlarge".to_string(),
                family: "m5".to_string(),
                normalization_factor: 8.0,
                instance_count: 2,
                fixed_price: 800.0,
                usage_price: 0.0,
                currency: "USD".to_string(),
                start_date: start - Duration::days(300),
                end_date: start + Duration::days(20),
                state: "active".to_string(),
                offering_class: "standard".to_string(),
                scope: "Region".to_string(),
                availability_zone: String::new(),
                region: "us-east-1".to_string(),
            }],
            usage: vec![
                UsageRecord {
                    tag: UsageTag::Usage,
                    product: PRODUCT_EC2.to_string(),
                    family: "m5".to_string(),
                    normalization_factor: 8.0,
                    normalized_usage: 17520.0,
                    cost: 500.0,
                    discounted_cost: 0.0,
                },
                UsageRecord {
                    tag: UsageTag::DiscountedUsage,
                    product: PRODUCT_EC2.to_string(),
                    family: "m5".to_string(),
                    normalization_factor: 8.0,
                    normalized_usage: 5840.0,
                    cost: 0.0,
                    discounted_cost: 150.0,
                },
            ],
            instances: vec![instance],
            storage: vec![BucketUsageRecord {
                bucket: "logs".to_string(),
                gb_months: 100.0,
                storage_cost: 2.5,
                bandwidth_cost: 0.5,
                requests_cost: 0.0,
            }],
            prices: [("m5.xlarge".to_string(), 0.10)].into_iter().collect(),
        }
    }

    #[test]
    fn test_assemble_merges_all_sections() {
        let summary = assemble(&inputs(), &AssemblyOptions::default());

        assert_eq!(summary.account, "123456789012");
        assert_eq!(summary.reservations.total_active, 2);
        assert!(summary.reservations.expiring.is_some());

        assert_eq!(summary.low_used_ec2.low_used_instances, 1);
        assert_eq!(summary.low_used_rds.total_instances, 0);

        let suggestions = summary.suggestions.as_ref().expect("viable conversion");
        assert_eq!(suggestions[0].machines, 3);
        assert!((summary.potential_saving() - 281.0).abs() < 1e-9);

        let histogram = summary.cpu_histogram.as_ref().expect("one instance");
        assert_eq!(histogram.total(), 1);

        // 17520 on-demand vs 5840 discounted normalized unit-hours
        assert!((summary.proportions.on_demand_percent - 75.0).abs() < 1e-9);
        assert!((summary.proportions.discounted_percent - 25.0).abs() < 1e-9);

        // m5 holds all the power: 4 on-demand + 16 reserved
        assert_eq!(summary.family_power.len(), 1);
        assert!((summary.family_power[0].percent - 100.0).abs() < 1e-9);

        assert_eq!(summary.totals.ec2.count, 1);
        assert!((summary.totals.ec2.cost - 120.0).abs() < 1e-9);
        assert_eq!(summary.totals.s3.count, 1);
        assert!((summary.totals.s3.cost - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_assemble_empty_snapshot() {
        let mut empty = inputs();
        empty.reservations.clear();
        empty.usage.clear();
        empty.instances.clear();
        empty.storage.clear();

        let summary = assemble(&empty, &AssemblyOptions::default());
        assert_eq!(summary.reservations.total_active, 0);
        assert!(summary.reservations.expiring.is_none());
        assert!(summary.suggestions.is_none());
        assert!(summary.cpu_histogram.is_none());
        assert_eq!(summary.low_used_total(), 0);
        assert_eq!(summary.proportions.on_demand_percent, 0.0);
        assert!(summary.family_power.is_empty());
        assert_eq!(summary.totals.ec2.count, 0);
        assert_eq!(summary.potential_saving(), 0.0);
    }

    #[test]
    fn test_summary_round_trips_through_json() {
        let summary = assemble(&inputs(), &AssemblyOptions::default());
        let encoded = serde_json::to_string(&summary).expect("serializable");
        let decoded: ReportSummary = serde_json::from_str(&encoded).expect("deserializable");
        assert_eq!(decoded.account, summary.account);
        assert_eq!(decoded.reservations.total_active, 2);
        assert_eq!(
            decoded.suggestions.as_ref().map(|s| s.len()),
            summary.suggestions.as_ref().map(|s| s.len())
        );
    }
}
