//! Distribution summaries over usage and utilization snapshots

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{
    InstanceUtilizationRecord, ReservedInstanceRecord, ResourceKind, UsageRecord, UsageTag,
};

/// Default bucket count for CPU histograms
pub const DEFAULT_HISTOGRAM_BUCKETS: usize = 10;

/// Equal-width distribution of one metric across a set of values
///
/// Buckets are half-open on the right except the final bucket, which also
/// owns the maximum so every input lands somewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub bucket_width: f64,
    pub counts: Vec<u64>,
}

impl Histogram {
    /// Total number of values represented
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Build an equal-width histogram over raw values
///
/// Returns `None` for an empty input or a zero bucket count. When every
/// value is identical the width collapses to zero and everything lands in
/// the first bucket.
pub fn histogram(values: &[f64], buckets: usize) -> Option<Histogram> {
    if values.is_empty() || buckets == 0 {
        return None;
    }

    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for value in values {
        min = min.min(*value);
        max = max.max(*value);
    }

    let width = (max - min) / buckets as f64;
    let mut counts = vec![0u64; buckets];
    for value in values {
        let index = if width > 0.0 {
            (((value - min) / width) as usize).min(buckets - 1)
        } else {
            0
        };
        counts[index] += 1;
    }

    Some(Histogram {
        min,
        max,
        bucket_width: width,
        counts,
    })
}

/// Histogram of CPU-average percentages across EC2 utilization records
pub fn cpu_histogram(
    records: &[InstanceUtilizationRecord],
    buckets: usize,
) -> Option<Histogram> {
    let values: Vec<f64> = records
        .iter()
        .filter(|r| r.kind == ResourceKind::Ec2)
        .map(|r| r.cpu.average)
        .collect();
    histogram(&values, buckets)
}

/// Share of normalized usage split between plain and discounted line items
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UsageProportions {
    pub on_demand_percent: f64,
    pub discounted_percent: f64,
}

/// Percentage split of normalized usage between the two billing tags
///
/// Both percentages are zero when there is no usage at all; the split never
/// divides by zero.
pub fn usage_proportions(usage: &[UsageRecord]) -> UsageProportions {
    let mut on_demand = 0.0f64;
    let mut discounted = 0.0f64;
    for record in usage {
        match record.tag {
            UsageTag::Usage => on_demand += record.normalized_usage,
            UsageTag::DiscountedUsage => discounted += record.normalized_usage,
        }
    }

    let total = on_demand + discounted;
    if total == 0.0 {
        return UsageProportions::default();
    }
    UsageProportions {
        on_demand_percent: 100.0 * on_demand / total,
        discounted_percent: 100.0 * discounted / total,
    }
}

/// One instance family's share of total computational power
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyShare {
    pub family: String,
    pub percent: f64,
}

/// Per-family share of the fleet's computational power, descending
///
/// Power counts both running EC2 instances (one normalization factor each)
/// and reserved units (count times factor). An empty fleet yields an empty
/// distribution.
pub fn family_power_distribution(
    instances: &[InstanceUtilizationRecord],
    reservations: &[ReservedInstanceRecord],
) -> Vec<FamilyShare> {
    let mut by_family: BTreeMap<String, f64> = BTreeMap::new();
    let mut total = 0.0f64;

    for record in instances.iter().filter(|r| r.kind == ResourceKind::Ec2) {
        *by_family.entry(record.family.clone()).or_insert(0.0) += record.normalization_factor;
        total += record.normalization_factor;
    }
    for record in reservations {
        let power = record.instance_count as f64 * record.normalization_factor;
        *by_family.entry(record.family.clone()).or_insert(0.0) += power;
        total += power;
    }

    if total == 0.0 {
        return Vec::new();
    }

    let mut shares: Vec<FamilyShare> = by_family
        .into_iter()
        .map(|(family, power)| FamilyShare {
            family,
            percent: 100.0 * power / total,
        })
        .collect();
    shares.sort_by(|a, b| {
        b.percent
            .partial_cmp(&a.percent)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    shares
}
