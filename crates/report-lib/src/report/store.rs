//! Latest-report store
//!
//! Holds the most recent assembled summary per account for the read API.
//! Publishing replaces the previous summary; history lives with the
//! presentation pipeline, not here.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::{ReportSummary, ReportWindow};

/// Headline row for the per-account report index
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

impl ReportIndexEntry {
    fn from_summary(summary: &ReportSummary) -> Self {
        Self {
            account: summary.account.clone(),
            generated_at: summary.generated_at,
            window: summary.window,
            total_active_reservations: summary.reservations.total_active,
            low_used_instances: summary.low_used_total(),
            suggestion_count: summary.suggestions.as_ref().map_or(0, |s| s.len()),
            potential_saving: summary.potential_saving(),
        }
    }
}

/// Registry of the latest report per account
#[derive(Default)]
pub struct ReportStore {
    reports: DashMap<String, Arc<ReportSummary>>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self {
            reports: DashMap::new(),
        }
    }

    /// Publish a freshly assembled summary, replacing any previous one
    pub fn publish(&self, summary: ReportSummary) {
        debug!(account = %summary.account, "Publishing report summary");
        self.reports
            .insert(summary.account.clone(), Arc::new(summary));
    }

    /// Latest summary for an account
    pub fn latest(&self, account: &str) -> Option<Arc<ReportSummary>> {
        self.reports.get(account).map(|r| Arc::clone(r.value()))
    }

    /// Headline index across all accounts, ordered by account id
    pub fn index(&self) -> Vec<ReportIndexEntry> {
        let mut entries: Vec<ReportIndexEntry> = self
            .reports
            .iter()
            .map(|r| ReportIndexEntry::from_summary(r.value()))
            .collect();
        entries.sort_by(|a, b| a.account.cmp(&b.account));
        entries
    }

    /// Number of accounts with a published report
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}
