//! Data-source abstractions for report inputs
//!
//! The analysis core operates on fully-resolved in-memory snapshots; these
//! traits are the fetch boundary where upstream failures surface as typed
//! errors. A snapshot-directory implementation backs the daemon, reading
//! documents staged by the ingestion pipeline.

mod fetch;
mod snapshot;

pub use fetch::{fetch_all_regions, RegionFailure, RegionFetchReport, DEFAULT_FETCH_CONCURRENCY};
pub use snapshot::SnapshotStore;

use std::path::PathBuf;
use thiserror::Error;

use crate::models::{
    BucketUsageRecord, InstanceUtilizationRecord, ReservedInstanceRecord, ResourceKind,
    UsageRecord,
};
use crate::pricing::{PriceTable, PricingProfile};
use crate::report::ReportWindow;

pub use async_trait::async_trait;

/// Failures at the fetch boundary
#[derive(Debug, Error)]
pub enum SourceError {
    /// A dataset the caller cannot proceed without is absent
    #[error("missing {dataset} snapshot at {}", path.display())]
    MissingSnapshot {
        dataset: &'static str,
        path: PathBuf,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reserved-instance inventory, fetched per region
///
/// Callers fan out one fetch per region and merge the results; see
/// [`fetch_all_regions`] for the best-effort aggregation.
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn fetch_reservations(
        &self,
        account: &str,
        region: &str,
    ) -> Result<Vec<ReservedInstanceRecord>, SourceError>;
}

/// Aggregated billing usage buckets for one product over a window
#[async_trait]
pub trait UsageSource: Send + Sync {
    async fn query_usage(
        &self,
        account: &str,
        window: &ReportWindow,
        product: &str,
    ) -> Result<Vec<UsageRecord>, SourceError>;
}

/// Per-resource utilization statistics for one kind over a window
#[async_trait]
pub trait UtilizationSource: Send + Sync {
    async fn query_utilization(
        &self,
        account: &str,
        window: &ReportWindow,
        kind: ResourceKind,
    ) -> Result<Vec<InstanceUtilizationRecord>, SourceError>;
}

/// Storage bucket usage over a window
#[async_trait]
pub trait StorageSource: Send + Sync {
    async fn query_storage(
        &self,
        account: &str,
        window: &ReportWindow,
    ) -> Result<Vec<BucketUsageRecord>, SourceError>;
}

/// Reserved unit prices for the fixed purchase profile
///
/// Implementations return the completed, fully-paginated rate card;
/// pagination against the provider API is their concern alone.
#[async_trait]
pub trait PricingSource: Send + Sync {
    async fn fetch_reserved_unit_price(
        &self,
        profile: &PricingProfile,
    ) -> Result<PriceTable, SourceError>;
}
