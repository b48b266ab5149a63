//! Core library for component health monitoring
//!
//! This crate provides the core functionality for:
//! - Dynamic-baseline threshold alerting
//! - Dependency-graph root-cause analysis
//! - Trend diagnosis over sample history
//! - Host metrics collection and in-memory sample storage
//! - Health checks and observability

pub mod anomaly;
pub mod collector;
pub mod health;
pub mod models;
pub mod observability;
pub mod root_cause;
pub mod service;
pub mod store;

pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{MonitorMetrics, StructuredLogger};
pub use service::{MonitorError, MonitorService};
