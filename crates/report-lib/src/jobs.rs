//! Scheduled report jobs
//!
//! An explicit list of named jobs, each with its own interval loop:
//!
//! - `report-generation`: generate and publish a report for every configured
//!   account; accounts are processed as independent concurrent tasks and a
//!   failed account never blocks the others.
//! - `pricing-refresh`: re-fetch the reserved unit-price rate card used by
//!   subsequent report cycles.
//!
//! Each loop ticks on its own interval and observes the shutdown broadcast
//! cooperatively; ticks within one job are sequential, so a slow run never
//! overlaps the next one.

use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinSet;
use tokio::time::interval;
use tracing::{info, warn};

use crate::health::{components, HealthRegistry};
use crate::models::{AccountSpec, ResourceKind, PRODUCT_EC2};
use crate::observability::{ReportMetrics, StructuredLogger};
use crate::pricing::{PriceTable, PricingProfile};
use crate::report::{
    assemble, AssemblyOptions, Cadence, ReportInputs, ReportStore, ReportSummary, ReportWindow,
};
use crate::sources::{
    fetch_all_regions, InventorySource, PricingSource, SourceError, StorageSource, UsageSource,
    UtilizationSource, DEFAULT_FETCH_CONCURRENCY,
};

pub const REPORT_JOB: &str = "report-generation";
pub const PRICING_JOB: &str = "pricing-refresh";

/// The complete set of data sources a report cycle draws on
pub trait ReportSources:
    InventorySource + UsageSource + UtilizationSource + StorageSource + PricingSource + 'static
{
}

impl<T> ReportSources for T where
    T: InventorySource + UsageSource + UtilizationSource + StorageSource + PricingSource + 'static
{
}

/// Scheduling and policy knobs for the job loops
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub cadence: Cadence,
    pub accounts: Vec<AccountSpec>,
    pub report_interval: Duration,
    pub pricing_interval: Duration,
    pub fetch_concurrency: usize,
    pub pricing_profile: PricingProfile,
    pub assembly: AssemblyOptions,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            cadence: Cadence::Weekly,
            accounts: Vec::new(),
            report_interval: Duration::from_secs(3600),
            pricing_interval: Duration::from_secs(6 * 3600),
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            pricing_profile: PricingProfile::default(),
            assembly: AssemblyOptions::default(),
        }
    }
}

/// Interval scheduler owning the named jobs and their shared state
pub struct JobScheduler<S: ReportSources> {
    sources: Arc<S>,
    store: Arc<ReportStore>,
    prices: Arc<RwLock<PriceTable>>,
    health: HealthRegistry,
    metrics: ReportMetrics,
    logger: StructuredLogger,
    config: JobConfig,
}

impl<S: ReportSources> JobScheduler<S> {
    pub fn new(
        sources: Arc<S>,
        store: Arc<ReportStore>,
        health: HealthRegistry,
        config: JobConfig,
    ) -> Self {
        Self {
            sources,
            store,
            prices: Arc::new(RwLock::new(PriceTable::default())),
            health,
            metrics: ReportMetrics::new(),
            logger: StructuredLogger::new(config.cadence),
            config,
        }
    }

    /// Names of the scheduled jobs, for logging and introspection
    pub fn job_names() -> [&'static str; 2] {
        [REPORT_JOB, PRICING_JOB]
    }

    /// Re-fetch the rate card, replacing the shared table on success
    pub async fn refresh_pricing(&self) -> Result<usize, SourceError> {
        let table = self
            .sources
            .fetch_reserved_unit_price(&self.config.pricing_profile)
            .await?;
        let entries = table.len();

        let mut prices = self.prices.write().await;
        *prices = table;
        self.metrics.set_pricing_entries(entries as i64);
        self.logger.log_pricing_refreshed(entries);
        Ok(entries)
    }

    /// Generate and publish one account's report
    async fn report_account(
        &self,
        spec: &AccountSpec,
        window: ReportWindow,
    ) -> Result<ReportSummary, SourceError> {
        let started = Instant::now();
        self.logger.log_cycle_started(&spec.id, &window);

        let inventory = Arc::clone(&self.sources) as Arc<dyn InventorySource>;
        let fetch = fetch_all_regions(
            inventory,
            &spec.id,
            &spec.regions,
            self.config.fetch_concurrency,
        )
        .await;
        if !fetch.is_complete() {
            self.metrics
                .add_region_fetch_failures(fetch.failures.len() as u64);
            self.logger.log_region_failures(&spec.id, &fetch.failures);
        }

        let usage = self
            .sources
            .query_usage(&spec.id, &window, PRODUCT_EC2)
            .await?;
        let mut instances = self
            .sources
            .query_utilization(&spec.id, &window, ResourceKind::Ec2)
            .await?;
        instances.extend(
            self.sources
                .query_utilization(&spec.id, &window, ResourceKind::Rds)
                .await?,
        );
        let storage = self.sources.query_storage(&spec.id, &window).await?;
        let prices = self.prices.read().await.clone();

        let inputs = ReportInputs {
            account: spec.id.clone(),
            window,
            reservations: fetch.reservations,
            usage,
            instances,
            storage,
            prices,
        };
        let summary = assemble(&inputs, &self.config.assembly);

        for suggestion in summary.suggestions.as_deref().unwrap_or(&[]) {
            self.logger.log_suggestion(&summary.account, suggestion);
        }
        self.metrics.record_summary(&summary);
        self.logger
            .log_cycle_completed(&summary, started.elapsed().as_secs_f64());

        self.store.publish(summary.clone());
        Ok(summary)
    }

    /// Run one report cycle across every configured account
    ///
    /// Accounts are independent concurrent tasks; a failed account is logged
    /// and counted while the rest proceed.
    pub async fn run_report_cycle(self: &Arc<Self>) {
        let started = Instant::now();
        let window = ReportWindow::for_cadence(self.config.cadence, Utc::now());
        self.metrics.reset_suggestions();

        let mut tasks = JoinSet::new();
        for spec in self.config.accounts.clone() {
            let scheduler = Arc::clone(self);
            tasks.spawn(async move {
                let result = scheduler.report_account(&spec, window).await;
                (spec.id, result)
            });
        }

        let mut failed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(_))) => {}
                Ok((account, Err(err))) => {
                    failed += 1;
                    self.metrics.inc_account_failures();
                    self.logger.log_cycle_failed(&account, &err);
                }
                Err(err) => {
                    failed += 1;
                    self.metrics.inc_account_failures();
                    warn!(error = %err, "Account report task aborted");
                }
            }
        }

        self.metrics
            .observe_cycle_duration(started.elapsed().as_secs_f64());
        self.metrics.inc_cycles_completed();
        self.metrics.set_accounts_reported(self.store.len() as i64);

        if failed == 0 {
            self.health.set_healthy(components::REPORT_SCHEDULER).await;
        } else if failed < self.config.accounts.len() {
            self.health
                .set_degraded(
                    components::REPORT_SCHEDULER,
                    format!("{failed} account(s) failed in the last cycle"),
                )
                .await;
        } else if !self.config.accounts.is_empty() {
            self.health
                .set_unhealthy(components::REPORT_SCHEDULER, "Every account failed")
                .await;
        }

        // Readiness flips once the first cycle completes, even a partial one
        self.health.set_ready(true).await;
    }

    /// Run both job loops until the shutdown channel fires
    pub async fn run(self: Arc<Self>, shutdown: broadcast::Sender<()>) {
        info!(
            jobs = ?Self::job_names(),
            accounts = self.config.accounts.len(),
            cadence = %self.config.cadence,
            "Starting job scheduler"
        );

        // Load the rate card before the first report cycle can tick
        match self.refresh_pricing().await {
            Ok(_) => self.health.set_healthy(components::SNAPSHOT_STORE).await,
            Err(err) => {
                self.logger.log_pricing_refresh_failed(&err);
                self.health
                    .set_degraded(components::SNAPSHOT_STORE, err.to_string())
                    .await;
            }
        }

        let mut loops = JoinSet::new();

        let scheduler = Arc::clone(&self);
        let mut rx = shutdown.subscribe();
        loops.spawn(async move {
            let mut ticker = interval(scheduler.config.report_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => scheduler.run_report_cycle().await,
                    _ = rx.recv() => {
                        info!(job = REPORT_JOB, "Shutting down job loop");
                        break;
                    }
                }
            }
        });

        let scheduler = Arc::clone(&self);
        let mut rx = shutdown.subscribe();
        loops.spawn(async move {
            let mut ticker = interval(scheduler.config.pricing_interval);
            // The startup refresh consumed the immediate first tick
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match scheduler.refresh_pricing().await {
                            Ok(_) => {
                                scheduler.health.set_healthy(components::SNAPSHOT_STORE).await
                            }
                            Err(err) => {
                                scheduler.logger.log_pricing_refresh_failed(&err);
                                scheduler
                                    .health
                                    .set_degraded(components::SNAPSHOT_STORE, err.to_string())
                                    .await;
                            }
                        }
                    }
                    _ = rx.recv() => {
                        info!(job = PRICING_JOB, "Shutting down job loop");
                        break;
                    }
                }
            }
        });

        while loops.join_next().await.is_some() {}
    }
}
