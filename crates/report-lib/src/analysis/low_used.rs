//! Low-utilization detection and per-type aggregation
//!
//! A resource is low-used when its average CPU sits below one threshold AND
//! its peak stays below another. Both tests are necessary: a high-peak,
//! low-average instance is bursty, not idle, and must not be flagged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{CpuStats, InstanceUtilizationRecord, ResourceKind};

/// Per-kind aggregates retained for the report summary
pub const TOP_AGGREGATES: usize = 5;

/// CPU thresholds qualifying a resource as low-used
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LowUsageThresholds {
    /// Average CPU percentage below which a resource qualifies
    pub cpu_average_below: f64,
    /// Peak CPU percentage the resource must also stay below
    pub cpu_peak_below: f64,
}

impl Default for LowUsageThresholds {
    fn default() -> Self {
        Self {
            cpu_average_below: 10.0,
            cpu_peak_below: 60.0,
        }
    }
}

/// Whether observed CPU statistics qualify as low-used
pub fn is_low_used(cpu: &CpuStats, thresholds: &LowUsageThresholds) -> bool {
    cpu.average < thresholds.cpu_average_below && cpu.peak < thresholds.cpu_peak_below
}

/// Low-used resources sharing one instance type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowUsedAggregate {
    pub instance_type: String,
    /// Summed computational power (normalization factors)
    pub power: f64,
    /// Summed cost across all breakdown components
    pub cost: f64,
    /// Display names of the aggregated resources, in input order
    pub names: Vec<String>,
}

/// One resource kind's low-usage picture for a report window
///
/// `top` holds only the costliest aggregates; the counters always reflect
/// the complete input set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowUsageReport {
    pub kind: ResourceKind,
    pub total_instances: u64,
    pub low_used_instances: u64,
    pub low_used_cost: f64,
    /// Costliest aggregates, descending by cost, at most [`TOP_AGGREGATES`]
    pub top: Vec<LowUsedAggregate>,
}

/// Reduce utilization records of one kind into a low-usage report
///
/// Records of other kinds are ignored so callers can pass the full staged
/// snapshot. EC2 aggregates key on the instance type, RDS on the DB
/// instance class; both arrive through the same `instance_type` field.
pub fn aggregate_low_used(
    records: &[InstanceUtilizationRecord],
    kind: ResourceKind,
    thresholds: &LowUsageThresholds,
) -> LowUsageReport {
    let mut total_instances = 0u64;
    let mut low_used_instances = 0u64;
    let mut low_used_cost = 0.0f64;
    let mut by_type: BTreeMap<String, LowUsedAggregate> = BTreeMap::new();

    for record in records.iter().filter(|r| r.kind == kind) {
        total_instances += 1;
        if !is_low_used(&record.cpu, thresholds) {
            continue;
        }

        low_used_instances += 1;
        let cost = record.total_cost();
        low_used_cost += cost;

        let entry = by_type
            .entry(record.instance_type.clone())
            .or_insert_with(|| LowUsedAggregate {
                instance_type: record.instance_type.clone(),
                power: 0.0,
                cost: 0.0,
                names: Vec::new(),
            });
        entry.power += record.normalization_factor;
        entry.cost += cost;
        entry.names.push(record.name.clone());
    }

    let mut top: Vec<LowUsedAggregate> = by_type.into_values().collect();
    top.sort_by(|a, b| b.cost.partial_cmp(&a.cost).unwrap_or(std::cmp::Ordering::Equal));
    top.truncate(TOP_AGGREGATES);

    LowUsageReport {
        kind,
        total_instances,
        low_used_instances,
        low_used_cost,
        top,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn record(
        name: &str,
        kind: ResourceKind,
        instance_type: &str,
        average: f64,
        peak: f64,
        cost: f64,
    ) -> InstanceUtilizationRecord {
        let (family, factor) = crate::normalization::family_and_factor(instance_type);
        let mut costs = BTreeMap::new();
        costs.insert("instance".to_string(), cost);
        InstanceUtilizationRecord {
            id: format!("i-{name}"),
            name: name.to_string(),
            kind,
            instance_type: instance_type.to_string(),
            family,
            normalization_factor: factor,
            region: "us-east-1".to_string(),
            costs,
            cpu: CpuStats { average, peak },
            network: None,
            free_space: None,
        }
    }

    #[test]
    fn test_classification_requires_both_thresholds() {
        let thresholds = LowUsageThresholds::default();

        // Bursty: low average but high peak
        assert!(!is_low_used(&CpuStats { average: 5.0, peak: 80.0 }, &thresholds));
        // Genuinely idle
        assert!(is_low_used(&CpuStats { average: 5.0, peak: 40.0 }, &thresholds));
        // Busy on average
        assert!(!is_low_used(&CpuStats { average: 15.0, peak: 40.0 }, &thresholds));
    }

    #[test]
    fn test_aggregation_by_type() {
        let records = vec![
            record("web-1", ResourceKind::Ec2, "m5.large", 3.0, 20.0, 50.0),
            record("web-2", ResourceKind::Ec2, "m5.large", 4.0, 30.0, 60.0),
            record("batch-1", ResourceKind::Ec2, "c5.xlarge", 2.0, 10.0, 200.0),
            record("busy-1", ResourceKind::Ec2, "m5.large", 50.0, 90.0, 70.0),
        ];

        let report =
            aggregate_low_used(&records, ResourceKind::Ec2, &LowUsageThresholds::default());
        assert_eq!(report.total_instances, 4);
        assert_eq!(report.low_used_instances, 3);
        assert!((report.low_used_cost - 310.0).abs() < 1e-9);

        // Ranked by descending cost
        assert_eq!(report.top[0].instance_type, "c5.xlarge");
        assert!((report.top[0].power - 8.0).abs() < 1e-9);
        assert_eq!(report.top[1].instance_type, "m5.large");
        assert!((report.top[1].power - 8.0).abs() < 1e-9);
        assert_eq!(report.top[1].names, vec!["web-1", "web-2"]);
    }

    #[test]
    fn test_kinds_are_independent() {
        let records = vec![
            record("web-1", ResourceKind::Ec2, "m5.large", 3.0, 20.0, 50.0),
            record("db-1", ResourceKind::Rds, "db.m5.large", 3.0, 20.0, 80.0),
        ];

        let ec2 = aggregate_low_used(&records, ResourceKind::Ec2, &LowUsageThresholds::default());
        let rds = aggregate_low_used(&records, ResourceKind::Rds, &LowUsageThresholds::default());

        assert_eq!(ec2.total_instances, 1);
        assert_eq!(rds.total_instances, 1);
        assert_eq!(rds.top[0].instance_type, "db.m5.large");
        assert!((rds.low_used_cost - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_totals_cover_more_than_top() {
        // Six distinct types, all low-used: only five survive the cut but
        // the counters still cover all six.
        let types = ["m5.large", "c5.large", "r5.large", "t3.small", "m4.large", "c4.large"];
        let records: Vec<_> = types
            .iter()
            .enumerate()
            .map(|(i, t)| {
                record(&format!("srv-{i}"), ResourceKind::Ec2, t, 1.0, 10.0, (i + 1) as f64)
            })
            .collect();

        let report =
            aggregate_low_used(&records, ResourceKind::Ec2, &LowUsageThresholds::default());
        assert_eq!(report.low_used_instances, 6);
        assert_eq!(report.top.len(), TOP_AGGREGATES);
        assert!((report.low_used_cost - 21.0).abs() < 1e-9);
        assert!((report.top[0].cost - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input() {
        let report = aggregate_low_used(&[], ResourceKind::Ec2, &LowUsageThresholds::default());
        assert_eq!(report.total_instances, 0);
        assert_eq!(report.low_used_instances, 0);
        assert!(report.top.is_empty());
    }
}
