//! Observability infrastructure for the component monitor
//!
//! Provides:
//! - Prometheus metrics (ingestion, alerts, analyses, collection latency)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::models::{AlertDecision, RootCauseResult, TrendAnalysis};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance, `None` if registration failed
static GLOBAL_METRICS: OnceLock<Option<MonitorMetricsInner>> = OnceLock::new();

struct MonitorMetricsInner {
    samples_ingested: IntCounter,
    alerts_raised: IntCounter,
    root_cause_analyses: IntCounter,
    root_cause_degraded: IntCounter,
    diagnoses_emitted: IntCounterVec,
    collection_latency_seconds: Histogram,
    collection_errors: IntCounter,
    baselines_tracked: IntGauge,
}

impl MonitorMetricsInner {
    fn new() -> prometheus::Result<Self> {
        Ok(Self {
            samples_ingested: register_int_counter!(
                "component_monitor_samples_ingested_total",
                "Total number of samples recorded in the metric store"
            )?,
            alerts_raised: register_int_counter!(
                "component_monitor_alerts_raised_total",
                "Total number of threshold alerts raised"
            )?,
            root_cause_analyses: register_int_counter!(
                "component_monitor_root_cause_analyses_total",
                "Total number of root cause analyses performed"
            )?,
            root_cause_degraded: register_int_counter!(
                "component_monitor_root_cause_degraded_total",
                "Root cause analyses that fell back to a degraded result"
            )?,
            diagnoses_emitted: register_int_counter_vec!(
                "component_monitor_diagnoses_emitted_total",
                "Trend diagnoses reported, by kind",
                &["kind"]
            )?,
            collection_latency_seconds: register_histogram!(
                "component_monitor_collection_latency_seconds",
                "Time spent collecting host metrics",
                LATENCY_BUCKETS.to_vec()
            )?,
            collection_errors: register_int_counter!(
                "component_monitor_collection_errors_total",
                "Total number of host collection errors"
            )?,
            baselines_tracked: register_int_gauge!(
                "component_monitor_baselines_tracked",
                "Number of entities with a baseline profile"
            )?,
        })
    }
}

/// Monitor metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct MonitorMetrics {
    _private: (),
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorMetrics {
    /// Create a new metrics handle (registers global metrics on first call)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(|| match MonitorMetricsInner::new() {
            Ok(inner) => Some(inner),
            Err(e) => {
                warn!(error = %e, "Failed to register Prometheus metrics, metrics disabled");
                None
            }
        });
        Self { _private: () }
    }

    fn inner(&self) -> Option<&MonitorMetricsInner> {
        GLOBAL_METRICS.get().and_then(Option::as_ref)
    }

    pub fn inc_samples_ingested(&self) {
        if let Some(m) = self.inner() {
            m.samples_ingested.inc();
        }
    }

    pub fn inc_alerts_raised(&self) {
        if let Some(m) = self.inner() {
            m.alerts_raised.inc();
        }
    }

    /// Count one root cause analysis, flagging degraded fallbacks
    pub fn record_root_cause(&self, degraded: bool) {
        if let Some(m) = self.inner() {
            m.root_cause_analyses.inc();
            if degraded {
                m.root_cause_degraded.inc();
            }
        }
    }

    pub fn inc_diagnosis(&self, kind: &str) {
        if let Some(m) = self.inner() {
            m.diagnoses_emitted.with_label_values(&[kind]).inc();
        }
    }

    /// Record a collection latency observation
    pub fn observe_collection_latency(&self, duration_secs: f64) {
        if let Some(m) = self.inner() {
            m.collection_latency_seconds.observe(duration_secs);
        }
    }

    pub fn inc_collection_errors(&self) {
        if let Some(m) = self.inner() {
            m.collection_errors.inc();
        }
    }

    pub fn set_baselines_tracked(&self, count: usize) {
        if let Some(m) = self.inner() {
            m.baselines_tracked.set(count as i64);
        }
    }
}

/// Structured logger for monitor events
///
/// Emits one named event per significant analysis outcome so log pipelines
/// can filter on the `event` field.
#[derive(Clone)]
pub struct StructuredLogger {
    node_name: String,
}

impl StructuredLogger {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
        }
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// Log a fired threshold alert
    pub fn log_alert(&self, entity: &str, decision: &AlertDecision) {
        warn!(
            event = "alert_raised",
            node = %self.node_name,
            entity = %entity,
            level = %decision.level,
            signals = ?decision.triggered,
            message = %decision.message,
            "Threshold alert raised"
        );
    }

    /// Log the outcome of a root cause analysis
    pub fn log_root_cause(&self, result: &RootCauseResult) {
        if result.degraded {
            warn!(
                event = "root_cause_inferred",
                node = %self.node_name,
                affected = %result.affected_component,
                root_cause = %result.root_cause,
                confidence = result.confidence,
                degraded = true,
                evidence = %result.evidence,
                "Root cause analysis returned a degraded result"
            );
        } else {
            info!(
                event = "root_cause_inferred",
                node = %self.node_name,
                affected = %result.affected_component,
                root_cause = %result.root_cause,
                confidence = result.confidence,
                chain_len = result.dependency_chain.len(),
                "Root cause inferred"
            );
        }
    }

    /// Log the findings of a trend analysis
    pub fn log_trend_diagnosis(&self, component: &str, analysis: &TrendAnalysis) {
        for diagnosis in &analysis.diagnoses {
            info!(
                event = "trend_diagnosed",
                node = %self.node_name,
                component = %component,
                kind = %diagnosis.kind,
                confidence = diagnosis.confidence,
                evidence = %diagnosis.evidence,
                "Trend diagnosis reported"
            );
        }
    }

    /// Log a failed collection cycle
    pub fn log_collection_failure(&self, error: &str) {
        warn!(
            event = "collection_failed",
            node = %self.node_name,
            error = %error,
            "Host metrics collection failed"
        );
    }

    /// Log monitor startup
    pub fn log_startup(&self, version: &str) {
        info!(
            event = "monitor_started",
            node = %self.node_name,
            version = %version,
            "Component monitor started"
        );
    }

    /// Log monitor shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "monitor_shutdown",
            node = %self.node_name,
            reason = %reason,
            "Component monitor shutting down"
        );
    }
}
