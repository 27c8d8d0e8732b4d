//! Observability for report generation
//!
//! Provides:
//! - Prometheus metrics for report cycles, fetch failures and the headline
//!   cost figures of each account's latest report
//! - A structured logging facade for report-cycle events
//!
//! Accepted conversion suggestions are exported as a gauge labeled by
//! account and instance type — the full accepted set, not just the top
//! suggestions surfaced in human-facing output.

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_gauge,
    register_int_gauge_vec, GaugeVec, Histogram, IntCounter, IntGauge, IntGaugeVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::analysis::ConversionSuggestion;
use crate::report::{Cadence, ReportSummary, ReportWindow};
use crate::sources::RegionFailure;

/// Buckets for report generation duration (in seconds)
const CYCLE_DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ReportMetricsInner> = OnceLock::new();

/// Inner structure holding the actual Prometheus metrics
struct ReportMetricsInner {
    cycle_duration_seconds: Histogram,
    cycles_completed: IntCounter,
    account_failures: IntCounter,
    region_fetch_failures: IntCounter,
    accounts_reported: IntGauge,
    pricing_entries: IntGauge,
    instances_total: IntGaugeVec,
    low_used_instances: IntGaugeVec,
    low_used_cost: GaugeVec,
    expiring_reservations: IntGaugeVec,
    potential_saving: GaugeVec,
    suggestion_saving: GaugeVec,
}

impl ReportMetricsInner {
    fn new() -> Self {
        Self {
            cycle_duration_seconds: register_histogram!(
                "costwatch_report_cycle_duration_seconds",
                "Time spent generating reports for all accounts in one cycle",
                CYCLE_DURATION_BUCKETS.to_vec()
            )
            .expect("Failed to register cycle_duration_seconds"),

            cycles_completed: register_int_counter!(
                "costwatch_report_cycles_completed_total",
                "Total number of completed report cycles"
            )
            .expect("Failed to register cycles_completed"),

            account_failures: register_int_counter!(
                "costwatch_account_report_failures_total",
                "Total number of per-account report failures"
            )
            .expect("Failed to register account_failures"),

            region_fetch_failures: register_int_counter!(
                "costwatch_region_fetch_failures_total",
                "Total number of region inventory fetches excluded from a merge"
            )
            .expect("Failed to register region_fetch_failures"),

            accounts_reported: register_int_gauge!(
                "costwatch_accounts_reported",
                "Number of accounts with a published report"
            )
            .expect("Failed to register accounts_reported"),

            pricing_entries: register_int_gauge!(
                "costwatch_pricing_entries",
                "Instance types in the loaded reserved unit-price rate card"
            )
            .expect("Failed to register pricing_entries"),

            instances_total: register_int_gauge_vec!(
                "costwatch_instances_total",
                "Instances covered by the latest report",
                &["account", "kind"]
            )
            .expect("Failed to register instances_total"),

            low_used_instances: register_int_gauge_vec!(
                "costwatch_low_used_instances",
                "Instances classified low-used in the latest report",
                &["account", "kind"]
            )
            .expect("Failed to register low_used_instances"),

            low_used_cost: register_gauge_vec!(
                "costwatch_low_used_cost_usd",
                "Cost of low-used instances in the latest report",
                &["account", "kind"]
            )
            .expect("Failed to register low_used_cost"),

            expiring_reservations: register_int_gauge_vec!(
                "costwatch_expiring_reservations",
                "Reservation units ending before the forecast horizon",
                &["account"]
            )
            .expect("Failed to register expiring_reservations"),

            potential_saving: register_gauge_vec!(
                "costwatch_potential_saving_usd",
                "Total saving across accepted conversion suggestions",
                &["account"]
            )
            .expect("Failed to register potential_saving"),

            suggestion_saving: register_gauge_vec!(
                "costwatch_suggestion_saving_usd",
                "Estimated saving per accepted conversion suggestion",
                &["account", "instance_type"]
            )
            .expect("Failed to register suggestion_saving"),
        }
    }
}

/// Report metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct ReportMetrics {
    _private: (),
}

impl Default for ReportMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ReportMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ReportMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record how long one full report cycle took
    pub fn observe_cycle_duration(&self, duration_secs: f64) {
        self.inner().cycle_duration_seconds.observe(duration_secs);
    }

    pub fn inc_cycles_completed(&self) {
        self.inner().cycles_completed.inc();
    }

    pub fn inc_account_failures(&self) {
        self.inner().account_failures.inc();
    }

    pub fn add_region_fetch_failures(&self, count: u64) {
        self.inner().region_fetch_failures.inc_by(count);
    }

    pub fn set_accounts_reported(&self, count: i64) {
        self.inner().accounts_reported.set(count);
    }

    pub fn set_pricing_entries(&self, count: i64) {
        self.inner().pricing_entries.set(count);
    }

    /// Drop suggestion gauges from previous cycles
    ///
    /// Called once per cycle so suggestions that are no longer accepted stop
    /// being exported, rather than lingering at their last value.
    pub fn reset_suggestions(&self) {
        self.inner().suggestion_saving.reset();
    }

    /// Export the headline figures of one account's freshly assembled report
    pub fn record_summary(&self, summary: &ReportSummary) {
        let inner = self.inner();
        let account = summary.account.as_str();

        inner
            .instances_total
            .with_label_values(&[account, "ec2"])
            .set(summary.totals.ec2.count as i64);
        inner
            .instances_total
            .with_label_values(&[account, "rds"])
            .set(summary.totals.rds.count as i64);

        inner
            .low_used_instances
            .with_label_values(&[account, "ec2"])
            .set(summary.low_used_ec2.low_used_instances as i64);
        inner
            .low_used_instances
            .with_label_values(&[account, "rds"])
            .set(summary.low_used_rds.low_used_instances as i64);

        inner
            .low_used_cost
            .with_label_values(&[account, "ec2"])
            .set(summary.low_used_ec2.low_used_cost);
        inner
            .low_used_cost
            .with_label_values(&[account, "rds"])
            .set(summary.low_used_rds.low_used_cost);

        let expiring = summary
            .reservations
            .expiring
            .as_ref()
            .map_or(0, |e| e.total_count);
        inner
            .expiring_reservations
            .with_label_values(&[account])
            .set(expiring);

        inner
            .potential_saving
            .with_label_values(&[account])
            .set(summary.potential_saving());

        for suggestion in summary.suggestions.as_deref().unwrap_or(&[]) {
            inner
                .suggestion_saving
                .with_label_values(&[account, &suggestion.instance_type])
                .set(suggestion.saving());
        }
    }
}

/// Structured logger for report-cycle events
///
/// Emits consistent `tracing` events with typed fields for cycle progress,
/// fetch failures and accepted suggestions.
#[derive(Clone)]
pub struct StructuredLogger {
    cadence: Cadence,
}

impl StructuredLogger {
    pub fn new(cadence: Cadence) -> Self {
        Self { cadence }
    }

    pub fn log_startup(&self, version: &str, accounts: usize) {
        info!(
            event = "reporter_started",
            cadence = %self.cadence,
            version = %version,
            accounts = accounts,
            "Report daemon started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "reporter_shutdown",
            cadence = %self.cadence,
            reason = %reason,
            "Report daemon shutting down"
        );
    }

    pub fn log_cycle_started(&self, account: &str, window: &ReportWindow) {
        info!(
            event = "report_cycle_started",
            account = %account,
            cadence = %self.cadence,
            window_start = %window.start,
            window_end = %window.end,
            "Generating report"
        );
    }

    pub fn log_cycle_completed(&self, summary: &ReportSummary, duration_secs: f64) {
        info!(
            event = "report_cycle_completed",
            account = %summary.account,
            cadence = %self.cadence,
            duration_secs = duration_secs,
            reservations = summary.reservations.total_active,
            expiring = summary
                .reservations
                .expiring
                .as_ref()
                .map_or(0, |e| e.total_count),
            low_used = summary.low_used_total(),
            suggestions = summary.suggestions.as_ref().map_or(0, |s| s.len()),
            potential_saving = summary.potential_saving(),
            "Report published"
        );
    }

    pub fn log_cycle_failed(&self, account: &str, error: &dyn std::fmt::Display) {
        warn!(
            event = "report_cycle_failed",
            account = %account,
            cadence = %self.cadence,
            error = %error,
            "Report generation failed; other accounts proceed"
        );
    }

    pub fn log_region_failures(&self, account: &str, failures: &[RegionFailure]) {
        for failure in failures {
            warn!(
                event = "region_fetch_failed",
                account = %account,
                region = %failure.region,
                error = %failure.error,
                "Region excluded from merged inventory"
            );
        }
    }

    pub fn log_suggestion(&self, account: &str, suggestion: &ConversionSuggestion) {
        info!(
            event = "suggestion_accepted",
            account = %account,
            instance_type = %suggestion.instance_type,
            machines = suggestion.machines,
            on_demand_cost = suggestion.on_demand_cost,
            reserved_cost = suggestion.reserved_cost,
            delta_percent = suggestion.delta_percent,
            "Conversion suggestion accepted"
        );
    }

    pub fn log_pricing_refreshed(&self, entries: usize) {
        info!(
            event = "pricing_refreshed",
            entries = entries,
            "Reserved unit-price rate card refreshed"
        );
    }

    pub fn log_pricing_refresh_failed(&self, error: &dyn std::fmt::Display) {
        warn!(
            event = "pricing_refresh_failed",
            error = %error,
            "Keeping previous rate card"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{assemble, AssemblyOptions, ReportInputs};
    use crate::pricing::PriceTable;
    use chrono::{Duration, TimeZone, Utc};

    fn empty_summary(account: &str) -> ReportSummary {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let inputs = ReportInputs {
            account: account.to_string(),
            window: ReportWindow {
                cadence: Cadence::Weekly,
                start,
                end: start + Duration::hours(168),
            },
            reservations: Vec::new(),
            usage: Vec::new(),
            instances: Vec::new(),
            storage: Vec::new(),
            prices: PriceTable::default(),
        };
        assemble(&inputs, &AssemblyOptions::default())
    }

    #[test]
    fn test_metrics_handle_records() {
        // Metrics live in a process-global registry; this exercises every
        // setter once against a fresh summary.
        let metrics = ReportMetrics::new();

        metrics.observe_cycle_duration(0.2);
        metrics.inc_cycles_completed();
        metrics.inc_account_failures();
        metrics.add_region_fetch_failures(2);
        metrics.set_accounts_reported(1);
        metrics.set_pricing_entries(40);
        metrics.reset_suggestions();
        metrics.record_summary(&empty_summary("123456789012"));
    }

    #[test]
    fn test_logger_creation() {
        let logger = StructuredLogger::new(Cadence::Monthly);
        assert_eq!(logger.cadence, Cadence::Monthly);
    }
}
