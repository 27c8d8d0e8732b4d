//! Snapshot-directory data sources
//!
//! The ingestion pipeline stages fetched provider data as JSON documents
//! under one root:
//!
//! ```text
//! <root>/<account>/reservations/<region>.json
//! <root>/<account>/usage.json
//! <root>/<account>/instances.json
//! <root>/<account>/storage.json
//! <root>/pricing.json
//! ```
//!
//! Reservations and pricing are required datasets; a missing file is a
//! fetch error. Usage, instance and storage documents may simply not be
//! staged yet and read as empty.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::{
    InventorySource, PricingSource, SourceError, StorageSource, UsageSource, UtilizationSource,
};
use crate::models::{
    BucketUsageRecord, InstanceUtilizationRecord, ReservedInstanceRecord, ResourceKind,
    UsageRecord,
};
use crate::pricing::{PriceTable, PricingProfile};
use crate::report::ReportWindow;

/// Data sources backed by a staged snapshot directory
///
/// Staged documents already cover the report window being generated, so
/// the window parameters select nothing here; they exist for sources that
/// query by time range.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn account_dir(&self, account: &str) -> PathBuf {
        self.root.join(account)
    }

    /// Decode a JSON document, mapping a missing file to `None`
    async fn read_optional<T: DeserializeOwned>(
        &self,
        path: &Path,
    ) -> Result<Option<T>, SourceError> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(SourceError::Io {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|err| SourceError::Decode {
                path: path.to_path_buf(),
                source: err,
            })
    }

    /// Decode a JSON document that must exist
    async fn read_required<T: DeserializeOwned>(
        &self,
        path: &Path,
        dataset: &'static str,
    ) -> Result<T, SourceError> {
        self.read_optional(path)
            .await?
            .ok_or_else(|| SourceError::MissingSnapshot {
                dataset,
                path: path.to_path_buf(),
            })
    }
}

#[async_trait]
impl InventorySource for SnapshotStore {
    async fn fetch_reservations(
        &self,
        account: &str,
        region: &str,
    ) -> Result<Vec<ReservedInstanceRecord>, SourceError> {
        let path = self
            .account_dir(account)
            .join("reservations")
            .join(format!("{region}.json"));
        self.read_required(&path, "reservations").await
    }
}

#[async_trait]
impl UsageSource for SnapshotStore {
    async fn query_usage(
        &self,
        account: &str,
        _window: &ReportWindow,
        product: &str,
    ) -> Result<Vec<UsageRecord>, SourceError> {
        let path = self.account_dir(account).join("usage.json");
        let records: Vec<UsageRecord> = self.read_optional(&path).await?.unwrap_or_default();
        Ok(records
            .into_iter()
            .filter(|r| r.product == product)
            .collect())
    }
}

#[async_trait]
impl UtilizationSource for SnapshotStore {
    async fn query_utilization(
        &self,
        account: &str,
        _window: &ReportWindow,
        kind: ResourceKind,
    ) -> Result<Vec<InstanceUtilizationRecord>, SourceError> {
        let path = self.account_dir(account).join("instances.json");
        let records: Vec<InstanceUtilizationRecord> =
            self.read_optional(&path).await?.unwrap_or_default();
        Ok(records.into_iter().filter(|r| r.kind == kind).collect())
    }
}

#[async_trait]
impl StorageSource for SnapshotStore {
    async fn query_storage(
        &self,
        account: &str,
        _window: &ReportWindow,
    ) -> Result<Vec<BucketUsageRecord>, SourceError> {
        let path = self.account_dir(account).join("storage.json");
        Ok(self.read_optional(&path).await?.unwrap_or_default())
    }
}

#[async_trait]
impl PricingSource for SnapshotStore {
    async fn fetch_reserved_unit_price(
        &self,
        _profile: &PricingProfile,
    ) -> Result<PriceTable, SourceError> {
        let path = self.root.join("pricing.json");
        let prices: BTreeMap<String, f64> = self.read_required(&path, "pricing").await?;
        Ok(PriceTable::new(prices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CpuStats, UsageTag, PRODUCT_EC2};
    use crate::report::Cadence;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    fn window() -> ReportWindow {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        ReportWindow {
            cadence: Cadence::Weekly,
            start,
            end: start + Duration::hours(168),
        }
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn reservation_json() -> String {
        serde_json::to_string(&vec![ReservedInstanceRecord {
            id: "ri-1".to_string(),
            instance_type: "m5.xlarge".to_string(),
            family: "m5".to_string(),
            normalization_factor: 8.0,
            instance_count: 2,
            fixed_price: 800.0,
            usage_price: 0.0,
            currency: "USD".to_string(),
            start_date: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            state: "active".to_string(),
            offering_class: "standard".to_string(),
            scope: "Region".to_string(),
            availability_zone: String::new(),
            region: "us-east-1".to_string(),
        }])
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_reservations_per_region() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "123/reservations/us-east-1.json",
            &reservation_json(),
        );

        let store = SnapshotStore::new(dir.path());
        let records = store.fetch_reservations("123", "us-east-1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].instance_type, "m5.xlarge");

        let missing = store.fetch_reservations("123", "eu-west-1").await;
        assert!(matches!(
            missing,
            Err(SourceError::MissingSnapshot { dataset: "reservations", .. })
        ));
    }

    #[tokio::test]
    async fn test_usage_filters_by_product() {
        let dir = TempDir::new().unwrap();
        let records = vec![
            UsageRecord {
                tag: UsageTag::Usage,
                product: PRODUCT_EC2.to_string(),
                family: "m5".to_string(),
                normalization_factor: 8.0,
                normalized_usage: 100.0,
                cost: 10.0,
                discounted_cost: 0.0,
            },
            UsageRecord {
                tag: UsageTag::Usage,
                product: "AmazonRDS".to_string(),
                family: "db.m5".to_string(),
                normalization_factor: 8.0,
                normalized_usage: 50.0,
                cost: 5.0,
                discounted_cost: 0.0,
            },
        ];
        write(
            dir.path(),
            "123/usage.json",
            &serde_json::to_string(&records).unwrap(),
        );

        let store = SnapshotStore::new(dir.path());
        let usage = store
            .query_usage("123", &window(), PRODUCT_EC2)
            .await
            .unwrap();
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].family, "m5");
    }

    #[tokio::test]
    async fn test_missing_optional_documents_read_empty() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());

        let usage = store
            .query_usage("123", &window(), PRODUCT_EC2)
            .await
            .unwrap();
        assert!(usage.is_empty());

        let instances = store
            .query_utilization("123", &window(), ResourceKind::Ec2)
            .await
            .unwrap();
        assert!(instances.is_empty());

        let storage = store.query_storage("123", &window()).await.unwrap();
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_utilization_filters_by_kind() {
        let dir = TempDir::new().unwrap();
        let records = vec![
            InstanceUtilizationRecord {
                id: "i-1".to_string(),
                name: "web".to_string(),
                kind: ResourceKind::Ec2,
                instance_type: "m5.large".to_string(),
                family: "m5".to_string(),
                normalization_factor: 4.0,
                region: "us-east-1".to_string(),
                costs: std::collections::BTreeMap::new(),
                cpu: CpuStats { average: 5.0, peak: 20.0 },
                network: None,
                free_space: None,
            },
            InstanceUtilizationRecord {
                id: "db-1".to_string(),
                name: "primary".to_string(),
                kind: ResourceKind::Rds,
                instance_type: "db.m5.large".to_string(),
                family: "db.m5".to_string(),
                normalization_factor: 4.0,
                region: "us-east-1".to_string(),
                costs: std::collections::BTreeMap::new(),
                cpu: CpuStats { average: 5.0, peak: 20.0 },
                network: None,
                free_space: None,
            },
        ];
        write(
            dir.path(),
            "123/instances.json",
            &serde_json::to_string(&records).unwrap(),
        );

        let store = SnapshotStore::new(dir.path());
        let ec2 = store
            .query_utilization("123", &window(), ResourceKind::Ec2)
            .await
            .unwrap();
        assert_eq!(ec2.len(), 1);
        assert_eq!(ec2[0].id, "i-1");

        let rds = store
            .query_utilization("123", &window(), ResourceKind::Rds)
            .await
            .unwrap();
        assert_eq!(rds.len(), 1);
        assert_eq!(rds[0].id, "db-1");
    }

    #[tokio::test]
    async fn test_pricing_required_and_decoded() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());

        let missing = store
            .fetch_reserved_unit_price(&PricingProfile::default())
            .await;
        assert!(matches!(
            missing,
            Err(SourceError::MissingSnapshot { dataset: "pricing", .. })
        ));

        write(dir.path(), "pricing.json", r#"{"m5.xlarge": 0.10}"#);
        let table = store
            .fetch_reserved_unit_price(&PricingProfile::default())
            .await
            .unwrap();
        assert_eq!(table.hourly("m5.xlarge"), Some(0.10));
    }

    #[tokio::test]
    async fn test_malformed_document_is_a_decode_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "123/usage.json", "{not json");

        let store = SnapshotStore::new(dir.path());
        let result = store.query_usage("123", &window(), PRODUCT_EC2).await;
        assert!(matches!(result, Err(SourceError::Decode { .. })));
    }
}
