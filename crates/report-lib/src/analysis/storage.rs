//! Storage bucket cost summaries

use serde::{Deserialize, Serialize};

use crate::models::BucketUsageRecord;
use crate::report::ReportWindow;

/// Buckets retained for the report summary
pub const TOP_BUCKETS: usize = 5;

/// One bucket's rolled-up usage and cost
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketCost {
    pub bucket: String,
    pub gb_months: f64,
    /// Storage plus bandwidth plus request cost
    pub cost: f64,
}

/// Account-wide storage picture for a report window
///
/// `top` holds only the costliest buckets; totals always reflect the
/// complete input set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSummary {
    pub bucket_count: u64,
    pub total_gb_months: f64,
    pub total_cost: f64,
    /// Mean cost per day over the window
    pub daily_cost: f64,
    /// Costliest buckets, descending by cost, at most [`TOP_BUCKETS`]
    pub top: Vec<BucketCost>,
}

/// Reduce bucket usage records into the account storage summary
pub fn summarize_storage(
    records: &[BucketUsageRecord],
    window: &ReportWindow,
) -> StorageSummary {
    let mut total_gb_months = 0.0f64;
    let mut total_cost = 0.0f64;
    let mut buckets: Vec<BucketCost> = Vec::with_capacity(records.len());

    for record in records {
        let cost = record.total_cost();
        total_gb_months += record.gb_months;
        total_cost += cost;
        buckets.push(BucketCost {
            bucket: record.bucket.clone(),
            gb_months: record.gb_months,
            cost,
        });
    }

    buckets.sort_by(|a, b| b.cost.partial_cmp(&a.cost).unwrap_or(std::cmp::Ordering::Equal));
    buckets.truncate(TOP_BUCKETS);

    let days = window.days();
    let daily_cost = if days > 0.0 { total_cost / days } else { 0.0 };

    StorageSummary {
        bucket_count: records.len() as u64,
        total_gb_months,
        total_cost,
        daily_cost,
        top: buckets,
    }
}
