//! Cost-optimization analysis over fetched billing snapshots
//!
//! This module provides the report computations:
//! - Reservation fleet totals and expiration forecasting
//! - Low-utilization detection with per-type aggregation
//! - On-demand to reserved conversion suggestions
//! - CPU histograms, usage proportions and power distribution
//! - Storage bucket cost summaries
//!
//! All computations are pure reductions over in-memory snapshots; nothing
//! here performs I/O or blocks.

mod advisor;
mod low_used;
mod reservations;
mod stats;
mod storage;

pub use advisor::{suggest_conversions, AdvisorOutcome, ConversionSuggestion, SUGGESTION_LIMIT};
pub use low_used::{
    aggregate_low_used, is_low_used, LowUsageReport, LowUsageThresholds, LowUsedAggregate,
    TOP_AGGREGATES,
};
pub use reservations::{
    expiration_horizon, summarize_reservations, ExpirationDate, ExpiringByType,
    ExpiringReservations, ReservationSummary,
};
pub use stats::{
    cpu_histogram, family_power_distribution, histogram, usage_proportions, FamilyShare,
    Histogram, UsageProportions, DEFAULT_HISTOGRAM_BUCKETS,
};
pub use storage::{summarize_storage, BucketCost, StorageSummary, TOP_BUCKETS};
