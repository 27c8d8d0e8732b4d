//! CostWatch report daemon
//!
//! Generates cost-optimization reports per account on a schedule and serves
//! the latest summaries over a read-only HTTP API.

use anyhow::Result;
use report_lib::health::{components, HealthRegistry};
use report_lib::jobs::{JobConfig, JobScheduler};
use report_lib::observability::{ReportMetrics, StructuredLogger};
use report_lib::report::{AssemblyOptions, ReportStore};
use report_lib::sources::SnapshotStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const REPORTER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::ReporterConfig::load()?;

    // JSON logs; RUST_LOG overrides the configured level
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(fmt::layer().json())
        .init();

    info!(
        data_dir = %config.data_dir.display(),
        cadence = %config.cadence,
        accounts = config.accounts.len(),
        "Starting cost-reporter"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::REPORT_SCHEDULER).await;
    health_registry.register(components::SNAPSHOT_STORE).await;
    health_registry.register(components::HTTP_SERVER).await;

    let _metrics = ReportMetrics::new();
    let logger = StructuredLogger::new(config.cadence);
    logger.log_startup(REPORTER_VERSION, config.accounts.len());

    let snapshots = Arc::new(SnapshotStore::new(&config.data_dir));
    let report_store = Arc::new(ReportStore::new());

    let job_config = JobConfig {
        cadence: config.cadence,
        accounts: config.accounts.clone(),
        report_interval: Duration::from_secs(config.report_interval_secs),
        pricing_interval: Duration::from_secs(config.pricing_refresh_interval_secs),
        fetch_concurrency: config.fetch_concurrency,
        assembly: AssemblyOptions {
            histogram_buckets: config.histogram_buckets,
            ..AssemblyOptions::default()
        },
        ..JobConfig::default()
    };
    let scheduler = Arc::new(JobScheduler::new(
        snapshots,
        Arc::clone(&report_store),
        health_registry.clone(),
        job_config,
    ));

    let (shutdown_tx, _) = broadcast::channel(1);

    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_tx.clone()));

    let app_state = Arc::new(api::AppState::new(health_registry.clone(), report_store));
    let api_handle = tokio::spawn(api::serve(
        config.listen_addr.clone(),
        app_state,
        shutdown_tx.subscribe(),
    ));

    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    let _ = shutdown_tx.send(());

    // Give in-flight jobs and open connections a bounded drain
    let drain = async {
        let _ = scheduler_handle.await;
        let _ = api_handle.await;
    };
    if tokio::time::timeout(Duration::from_secs(config.shutdown_timeout_secs), drain)
        .await
        .is_err()
    {
        info!("Shutdown timeout elapsed; exiting with jobs still in flight");
    }

    Ok(())
}
