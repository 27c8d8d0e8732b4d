//! Core library for the CostWatch report daemon
//!
//! This crate provides the core functionality for:
//! - Reserved-instance inventory summaries and expiration forecasting
//! - Low-utilization detection and per-type usage aggregation
//! - On-demand to reserved conversion suggestions with cost deltas
//! - Report assembly, storage and scheduled generation
//! - Health checks and observability

pub mod analysis;
pub mod health;
pub mod jobs;
pub mod models;
pub mod normalization;
pub mod observability;
pub mod pricing;
pub mod report;
pub mod sources;

pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ReportMetrics, StructuredLogger};
