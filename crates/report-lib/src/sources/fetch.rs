//! Fan-out inventory fetch across regions
//!
//! Spawns one fetch task per region under a concurrency bound, waits for
//! every task at the join barrier, and merges the results. A failed region
//! is logged and excluded from the merge rather than aborting the fetch;
//! callers inspect the side list when they need strict consistency.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::{InventorySource, SourceError};
use crate::models::ReservedInstanceRecord;

/// Concurrent region fetches allowed per account
pub const DEFAULT_FETCH_CONCURRENCY: usize = 4;

/// One region's fetch failure, kept aside from the merged inventory
#[derive(Debug, Clone)]
pub struct RegionFailure {
    pub region: String,
    pub error: String,
}

/// Merged inventory plus the regions that failed to contribute
#[derive(Debug, Default)]
pub struct RegionFetchReport {
    /// Records from every region that fetched cleanly, in region order
    pub reservations: Vec<ReservedInstanceRecord>,
    /// Regions excluded from the merge
    pub failures: Vec<RegionFailure>,
}

impl RegionFetchReport {
    /// Whether every region contributed to the merge
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fetch reservations for every region and merge the results
///
/// The merge preserves the order of `regions` so repeated runs over the
/// same snapshot produce identical output. `concurrency` caps in-flight
/// fetches; zero is treated as one.
pub async fn fetch_all_regions(
    source: Arc<dyn InventorySource>,
    account: &str,
    regions: &[String],
    concurrency: usize,
) -> RegionFetchReport {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (slot, region) in regions.iter().enumerate() {
        let source = Arc::clone(&source);
        let semaphore = Arc::clone(&semaphore);
        let account = account.to_string();
        let region = region.clone();

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let result = source.fetch_reservations(&account, &region).await;
            (slot, region, result)
        });
    }

    let mut slots: Vec<Option<Result<Vec<ReservedInstanceRecord>, SourceError>>> =
        (0..regions.len()).map(|_| None).collect();
    let mut aborted: Vec<RegionFailure> = Vec::new();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((slot, region, result)) => {
                if let Err(err) = &result {
                    warn!(region = %region, error = %err, "Region inventory fetch failed");
                }
                slots[slot] = Some(result);
            }
            Err(err) => {
                // A panicked task loses its region binding; record what we have
                warn!(error = %err, "Region fetch task aborted");
                aborted.push(RegionFailure {
                    region: String::from("(aborted)"),
                    error: err.to_string(),
                });
            }
        }
    }

    let mut report = RegionFetchReport::default();
    for (slot, region) in regions.iter().enumerate() {
        match slots[slot].take() {
            Some(Ok(records)) => {
                debug!(region = %region, count = records.len(), "Merged region inventory");
                report.reservations.extend(records);
            }
            Some(Err(err)) => report.failures.push(RegionFailure {
                region: region.clone(),
                error: err.to_string(),
            }),
            None => {}
        }
    }
    report.failures.extend(aborted);

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::async_trait;
    use chrono::Utc;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockInventory {
        fail_regions: Vec<&'static str>,
        calls: AtomicUsize,
    }

    impl MockInventory {
        fn new(fail_regions: Vec<&'static str>) -> Self {
            Self {
                fail_regions,
                calls: AtomicUsize::new(0),
            }
        }

        fn record(region: &str) -> ReservedInstanceRecord {
            ReservedInstanceRecord {
                id: format!("ri-{region}"),
                instance_type: "m5.large".to_string(),
                family: "m5".to_string(),
                normalization_factor: 4.0,
                instance_count: 1,
                fixed_price: 100.0,
                usage_price: 0.0,
                currency: "USD".to_string(),
                start_date: Utc::now(),
                end_date: Utc::now(),
                state: "active".to_string(),
                offering_class: "standard".to_string(),
                scope: "Region".to_string(),
                availability_zone: String::new(),
                region: region.to_string(),
            }
        }
    }

    #[async_trait]
    impl InventorySource for MockInventory {
        async fn fetch_reservations(
            &self,
            _account: &str,
            region: &str,
        ) -> Result<Vec<ReservedInstanceRecord>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_regions.contains(&region) {
                return Err(SourceError::MissingSnapshot {
                    dataset: "reservations",
                    path: PathBuf::from(format!("{region}.json")),
                });
            }
            Ok(vec![Self::record(region)])
        }
    }

    fn regions(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_merge_preserves_region_order() {
        let source = Arc::new(MockInventory::new(vec![]));
        let report = fetch_all_regions(
            source.clone(),
            "123",
            &regions(&["us-east-1", "eu-west-1", "ap-south-1"]),
            2,
        )
        .await;

        assert!(report.is_complete());
        let merged: Vec<_> = report.reservations.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(merged, vec!["us-east-1", "eu-west-1", "ap-south-1"]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_region_is_excluded_not_fatal() {
        let source = Arc::new(MockInventory::new(vec!["eu-west-1"]));
        let report = fetch_all_regions(
            source,
            "123",
            &regions(&["us-east-1", "eu-west-1", "ap-south-1"]),
            4,
        )
        .await;

        assert!(!report.is_complete());
        assert_eq!(report.reservations.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].region, "eu-west-1");
        assert!(report.failures[0].error.contains("reservations"));
    }

    #[tokio::test]
    async fn test_no_regions_yields_empty_report() {
        let source = Arc::new(MockInventory::new(vec![]));
        let report = fetch_all_regions(source, "123", &[], 4).await;
        assert!(report.is_complete());
        assert!(report.reservations.is_empty());
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_fetches() {
        let source = Arc::new(MockInventory::new(vec![]));
        let report = fetch_all_regions(source, "123", &regions(&["us-east-1"]), 0).await;
        assert_eq!(report.reservations.len(), 1);
    }
}
