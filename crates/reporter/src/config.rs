//! Reporter daemon configuration
//!
//! Layered: serde defaults, then an optional config file, then
//! `COSTWATCH_`-prefixed environment variables.

use anyhow::{Context, Result};
use report_lib::models::AccountSpec;
use report_lib::report::Cadence;
use serde::Deserialize;
use std::path::PathBuf;

/// Reporter daemon configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReporterConfig {
    /// Address the HTTP read API listens on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Root of the staged snapshot directory
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Accounts to report on, each with its inventory regions
    #[serde(default)]
    pub accounts: Vec<AccountSpec>,

    /// Report cadence: previous full week or previous full month
    #[serde(default = "default_cadence")]
    pub cadence: Cadence,

    /// Seconds between report-generation ticks
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,

    /// Seconds between pricing-refresh ticks
    #[serde(default = "default_pricing_interval")]
    pub pricing_refresh_interval_secs: u64,

    /// Concurrent region fetches per account
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    /// Buckets in the CPU-average histogram
    #[serde(default = "default_histogram_buckets")]
    pub histogram_buckets: usize,

    /// Seconds to wait for in-flight jobs on shutdown
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Log level used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/var/lib/costwatch/snapshots")
}

fn default_cadence() -> Cadence {
    Cadence::Weekly
}

fn default_report_interval() -> u64 {
    3600
}

fn default_pricing_interval() -> u64 {
    6 * 3600
}

fn default_fetch_concurrency() -> usize {
    report_lib::sources::DEFAULT_FETCH_CONCURRENCY
}

fn default_histogram_buckets() -> usize {
    report_lib::analysis::DEFAULT_HISTOGRAM_BUCKETS
}

fn default_shutdown_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ReporterConfig {
    /// Load configuration from the optional file and the environment
    ///
    /// The file path comes from `COSTWATCH_CONFIG` and defaults to
    /// `/etc/costwatch/reporter`; a missing file leaves the defaults in
    /// place.
    pub fn load() -> Result<Self> {
        let file = std::env::var("COSTWATCH_CONFIG")
            .unwrap_or_else(|_| "/etc/costwatch/reporter".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name(&file).required(false))
            .add_source(config::Environment::with_prefix("COSTWATCH").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: ReporterConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.cadence, Cadence::Weekly);
        assert_eq!(config.report_interval_secs, 3600);
        assert_eq!(config.histogram_buckets, 10);
        assert!(config.accounts.is_empty());
    }

    #[test]
    fn test_accounts_and_cadence_from_file_shape() {
        let raw = r#"{
            "cadence": "monthly",
            "data_dir": "/tmp/snapshots",
            "accounts": [
                {"id": "123456789012", "regions": ["us-east-1", "eu-west-1"]}
            ]
        }"#;
        let config: ReporterConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.cadence, Cadence::Monthly);
        assert_eq!(config.accounts.len(), 1);
        assert_eq!(config.accounts[0].regions.len(), 2);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/snapshots"));
    }
}
