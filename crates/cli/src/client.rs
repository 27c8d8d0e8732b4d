//! HTTP client for the reporter daemon's read API

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// Client for the reporter daemon
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid server URL")?;

        Ok(Self { client, base_url })
    }

    /// GET a JSON resource; a non-success status is an error
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }

    /// GET a JSON resource whose body is meaningful on any status
    ///
    /// The health endpoints return their payload with a 503 when the daemon
    /// is unhealthy or not ready; that payload is the answer, not an error.
    pub async fn get_lenient<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        response.json().await.context("Failed to parse response")
    }

    /// Per-account report index
    pub async fn report_index(&self) -> Result<Vec<ReportIndexEntry>> {
        self.get("api/v1/reports").await
    }

    /// Full latest summary for one account
    pub async fn report(&self, account: &str) -> Result<ReportSummary> {
        self.get(&format!("api/v1/reports/{account}")).await
    }

    /// Accepted conversion suggestions for one account
    pub async fn suggestions(&self, account: &str) -> Result<SuggestionsResponse> {
        self.get(&format!("api/v1/reports/{account}/suggestions"))
            .await
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.get_lenient("healthz").await
    }

    pub async fn readiness(&self) -> Result<ReadinessResponse> {
        self.get_lenient("readyz").await
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportWindow {
    pub cadence: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportIndexEntry {
    pub account: String,
    pub generated_at: DateTime<Utc>,
    pub window: ReportWindow,
    pub total_active_reservations: i64,
    pub low_used_instances: u64,
    pub suggestion_count: usize,
    pub potential_saving: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub account: String,
    pub generated_at: DateTime<Utc>,
    pub window: ReportWindow,
    pub reservations: ReservationSummary,
    pub low_used_ec2: LowUsageReport,
    pub low_used_rds: LowUsageReport,
    pub suggestions: Option<Vec<Suggestion>>,
    pub cpu_histogram: Option<Histogram>,
    pub proportions: UsageProportions,
    pub family_power: Vec<FamilyShare>,
    pub storage: StorageSummary,
    pub totals: ReportTotals,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationSummary {
    pub total_active: i64,
    pub total_invested: f64,
    pub expiring: Option<ExpiringReservations>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiringReservations {
    pub horizon: DateTime<Utc>,
    pub total_count: i64,
    pub by_type: Vec<ExpiringByType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiringByType {
    pub instance_type: String,
    pub count: i64,
    pub power: f64,
    pub dates: Vec<ExpirationDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpirationDate {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowUsageReport {
    pub kind: String,
    pub total_instances: u64,
    pub low_used_instances: u64,
    pub low_used_cost: f64,
    pub top: Vec<LowUsedAggregate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowUsedAggregate {
    pub instance_type: String,
    pub power: f64,
    pub cost: f64,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub instance_type: String,
    pub machines: u64,
    pub on_demand_cost: f64,
    pub reserved_cost: f64,
    pub delta_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub bucket_width: f64,
    pub counts: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageProportions {
    pub on_demand_percent: f64,
    pub discounted_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyShare {
    pub family: String,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSummary {
    pub bucket_count: u64,
    pub total_gb_months: f64,
    pub total_cost: f64,
    pub daily_cost: f64,
    pub top: Vec<BucketCost>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketCost {
    pub bucket: String,
    pub gb_months: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ProductTotals {
    pub count: u64,
    pub cost: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReportTotals {
    pub ec2: ProductTotals,
    pub rds: ProductTotals,
    pub s3: ProductTotals,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub account: String,
    pub generated_at: DateTime<Utc>,
    pub suggestions: Vec<SuggestionRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionRow {
    pub rank: usize,
    /// Inside the top cut used for human-facing output
    pub surfaced: bool,
    pub instance_type: String,
    pub machines: u64,
    pub on_demand_cost: f64,
    pub reserved_cost: f64,
    pub delta_percent: f64,
    pub saving: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: HashMap<String, ComponentHealth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
