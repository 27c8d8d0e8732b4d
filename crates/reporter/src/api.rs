//! HTTP read API: health, metrics and the latest reports
//!
//! Read-only surface over the report store; report generation happens in
//! the job scheduler, never in a request handler.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use prometheus::{Encoder, TextEncoder};
use report_lib::analysis::SUGGESTION_LIMIT;
use report_lib::health::{ComponentStatus, HealthRegistry};
use report_lib::report::ReportStore;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub report_store: Arc<ReportStore>,
}

impl AppState {
    pub fn new(health_registry: HealthRegistry, report_store: Arc<ReportStore>) -> Self {
        Self {
            health_registry,
            report_store,
        }
    }
}

/// One accepted suggestion with its rank in the served ordering
///
/// `surfaced` marks the rows inside the top cut used for human-facing
/// output; telemetry and this endpoint always carry the full accepted set.
#[derive(Debug, Clone, Serialize)]
struct SuggestionRow {
    rank: usize,
    surfaced: bool,
    instance_type: String,
    machines: u64,
    on_demand_cost: f64,
    reserved_cost: f64,
    delta_percent: f64,
    saving: f64,
}

#[derive(Debug, Clone, Serialize)]
struct SuggestionsResponse {
    account: String,
    generated_at: DateTime<Utc>,
    suggestions: Vec<SuggestionRow>,
}

/// Health check: 200 while operational, 503 once a component fails
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check: 503 until the first report cycle completes
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer).unwrap();

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Per-account report index with headline totals
async fn list_reports(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.report_store.index())
}

fn not_found(account: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("no report generated for account {account}") })),
    )
}

/// Full latest summary for one account
async fn show_report(
    State(state): State<Arc<AppState>>,
    Path(account): Path<String>,
) -> impl IntoResponse {
    match state.report_store.latest(&account) {
        Some(summary) => (StatusCode::OK, Json(json!(*summary))),
        None => not_found(&account),
    }
}

/// Accepted conversion suggestions for one account, full set
async fn show_suggestions(
    State(state): State<Arc<AppState>>,
    Path(account): Path<String>,
) -> impl IntoResponse {
    let Some(summary) = state.report_store.latest(&account) else {
        return not_found(&account);
    };

    let suggestions = summary
        .suggestions
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .enumerate()
        .map(|(i, s)| SuggestionRow {
            rank: i + 1,
            surfaced: i < SUGGESTION_LIMIT,
            instance_type: s.instance_type.clone(),
            machines: s.machines,
            on_demand_cost: s.on_demand_cost,
            reserved_cost: s.reserved_cost,
            delta_percent: s.delta_percent,
            saving: s.saving(),
        })
        .collect();

    let response = SuggestionsResponse {
        account: summary.account.clone(),
        generated_at: summary.generated_at,
        suggestions,
    };
    (StatusCode::OK, Json(json!(response)))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/reports", get(list_reports))
        .route("/api/v1/reports/:account", get(show_report))
        .route("/api/v1/reports/:account/suggestions", get(show_suggestions))
        .with_state(state)
}

/// Start the API server, draining on the shutdown broadcast
pub async fn serve(
    addr: String,
    state: Arc<AppState>,
    mut shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    Ok(())
}
