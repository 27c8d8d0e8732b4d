//! Core data models for billing and usage analysis

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Billing product code for EC2 usage line items
pub const PRODUCT_EC2: &str = "AmazonEC2";

/// One purchased reservation unit, as staged by the ingestion pipeline
///
/// Records are immutable snapshots per fetch cycle; a new fetch supersedes
/// the previous set rather than mutating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservedInstanceRecord {
    pub id: String,
    pub instance_type: String,
    pub family: String,
    pub normalization_factor: f64,
    pub instance_count: i64,
    pub fixed_price: f64,
    pub usage_price: f64,
    pub currency: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub state: String,
    pub offering_class: String,
    pub scope: String,
    pub availability_zone: String,
    pub region: String,
}

/// Billing line-item category a usage bucket was aggregated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UsageTag {
    /// Plain on-demand usage
    Usage,
    /// Usage already covered by a reservation
    DiscountedUsage,
}

/// Normalized on-demand usage bucketed by (tag, family, normalization factor)
///
/// Recomputed fully on each report generation from the billing query result;
/// never persisted incrementally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub tag: UsageTag,
    /// Billing product code, e.g. `AmazonEC2`
    pub product: String,
    pub family: String,
    pub normalization_factor: f64,
    /// Total normalized usage in unit-hours over the window
    pub normalized_usage: f64,
    pub cost: f64,
    pub discounted_cost: f64,
}

/// Resource kind a utilization record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Ec2,
    Rds,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Ec2 => "ec2",
            ResourceKind::Rds => "rds",
        }
    }
}

/// CPU statistics observed over a reporting period
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CpuStats {
    /// Mean utilization percentage
    pub average: f64,
    /// Highest observed utilization percentage
    pub peak: f64,
}

/// Network throughput observed over a reporting period, in bytes
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NetworkStats {
    pub rx_bytes: f64,
    pub tx_bytes: f64,
}

/// Free storage space observed over a reporting period, in bytes
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FreeSpaceStats {
    pub minimum: f64,
    pub maximum: f64,
    pub average: f64,
}

/// One resource's observed statistics for a reporting period
///
/// EC2 records carry the instance type and the `Name` tag as display name;
/// RDS records carry the DB instance class and identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceUtilizationRecord {
    pub id: String,
    pub name: String,
    pub kind: ResourceKind,
    pub instance_type: String,
    pub family: String,
    pub normalization_factor: f64,
    pub region: String,
    /// Cost breakdown: component (e.g. `instance`, `cloudwatch`) to amount
    pub costs: BTreeMap<String, f64>,
    pub cpu: CpuStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_space: Option<FreeSpaceStats>,
}

impl InstanceUtilizationRecord {
    /// Total cost across all breakdown components
    pub fn total_cost(&self) -> f64 {
        self.costs.values().sum()
    }
}

/// One storage bucket's usage and cost for a reporting period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketUsageRecord {
    pub bucket: String,
    /// Gigabyte-months stored over the window
    pub gb_months: f64,
    pub storage_cost: f64,
    pub bandwidth_cost: f64,
    pub requests_cost: f64,
}

impl BucketUsageRecord {
    /// Storage plus bandwidth plus request cost
    pub fn total_cost(&self) -> f64 {
        self.storage_cost + self.bandwidth_cost + self.requests_cost
    }
}

/// One tenant account and the regions its inventory is fetched from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSpec {
    pub id: String,
    pub regions: Vec<String>,
}
