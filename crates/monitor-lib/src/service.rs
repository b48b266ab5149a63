//! Monitor service
//!
//! Owns the baseline store, metric store and collector, and exposes the three
//! analysis entry points together with sample ingestion and store-backed
//! diagnosis. Every outcome is counted in Prometheus and logged as a named
//! event.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use crate::anomaly::{BaselineStore, ThresholdDetector, TrendDiagnoser, MAX_HISTORY_SAMPLES};
use crate::collector::{CollectionError, MetricsCollector};
use crate::models::{AlertDecision, DiskInfo, RootCauseResult, Sample, TrendAnalysis};
use crate::observability::{MonitorMetrics, StructuredLogger};
use crate::root_cause::{DependencyEdge, DiskCorrelation, RootCauseResolver};
use crate::store::{MetricStore, StoreError};

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Collection(#[from] CollectionError),
    #[error("no samples for component {component} in the last {window_secs}s")]
    NoSamples {
        component: String,
        window_secs: u64,
    },
    #[error("invalid sample: {0}")]
    InvalidSample(String),
    #[error("invalid window: {0}")]
    InvalidWindow(String),
}

/// Façade over the analysis core and its collaborators
pub struct MonitorService {
    baselines: Arc<BaselineStore>,
    detector: ThresholdDetector,
    resolver: RootCauseResolver,
    diagnoser: TrendDiagnoser,
    store: Arc<dyn MetricStore>,
    collector: Arc<dyn MetricsCollector>,
    metrics: MonitorMetrics,
    logger: StructuredLogger,
}

impl MonitorService {
    pub fn new(
        store: Arc<dyn MetricStore>,
        collector: Arc<dyn MetricsCollector>,
        baselines: Arc<BaselineStore>,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            detector: ThresholdDetector::new(baselines.clone()),
            resolver: RootCauseResolver::new(store.clone(), collector.clone()),
            diagnoser: TrendDiagnoser::new(),
            baselines,
            store,
            collector,
            metrics: MonitorMetrics::new(),
            logger,
        }
    }

    /// Select how disk correlation is scored by the resolver
    pub fn with_disk_correlation(mut self, mode: DiskCorrelation) -> Self {
        self.resolver = self.resolver.with_disk_correlation(mode);
        self
    }

    pub fn baselines(&self) -> &Arc<BaselineStore> {
        &self.baselines
    }

    pub fn store(&self) -> &Arc<dyn MetricStore> {
        &self.store
    }

    pub fn collector(&self) -> &Arc<dyn MetricsCollector> {
        &self.collector
    }

    pub fn metrics(&self) -> &MonitorMetrics {
        &self.metrics
    }

    pub fn logger(&self) -> &StructuredLogger {
        &self.logger
    }

    /// Check current values of `entity_key` against its baseline
    pub fn check_alert(
        &self,
        entity_key: &str,
        cpu: f64,
        mem: f64,
        response_time_ms: Option<u64>,
    ) -> AlertDecision {
        let decision = self
            .detector
            .check_alert(entity_key, cpu, mem, response_time_ms);
        self.metrics.set_baselines_tracked(self.baselines.len());

        if decision.need_alert {
            self.metrics.inc_alerts_raised();
            self.logger.log_alert(entity_key, &decision);
        }
        decision
    }

    /// Store a sample and run the threshold check on it.
    ///
    /// Samples carrying neither CPU nor memory are stored without a check.
    /// A missing CPU or memory value is checked as zero.
    pub fn ingest(&self, sample: Sample) -> Result<Option<AlertDecision>, MonitorError> {
        validate(&sample)?;

        let check = (sample.cpu_percent.is_some() || sample.mem_percent.is_some()).then(|| {
            (
                sample.component.clone(),
                sample.cpu_percent.unwrap_or(0.0),
                sample.mem_percent.unwrap_or(0.0),
                sample.response_time_ms,
            )
        });

        self.store.record(sample)?;
        self.metrics.inc_samples_ingested();

        Ok(check.map(|(entity, cpu, mem, response)| self.check_alert(&entity, cpu, mem, response)))
    }

    /// Infer the root cause of an anomaly on `affected`
    pub fn analyze_root_cause(&self, affected: &str) -> RootCauseResult {
        let result = self.resolver.analyze_root_cause(affected);
        self.metrics.record_root_cause(result.degraded);
        self.logger.log_root_cause(&result);
        result
    }

    /// Diagnose `current` against an explicit history (oldest first)
    pub fn analyze(&self, current: &Sample, history: &[Sample]) -> TrendAnalysis {
        let analysis = self.diagnoser.analyze(current, history);
        for diagnosis in &analysis.diagnoses {
            self.metrics.inc_diagnosis(&diagnosis_label(diagnosis.kind));
        }
        self.logger.log_trend_diagnosis(&current.component, &analysis);
        analysis
    }

    /// Diagnose `component` from the samples stored within `window`.
    ///
    /// The newest stored sample is used as the current value and stays part
    /// of the history.
    pub fn diagnose(&self, component: &str, window: Duration) -> Result<TrendAnalysis, MonitorError> {
        let end = Utc::now();
        let start = end
            - chrono::Duration::from_std(window)
                .map_err(|e| MonitorError::InvalidWindow(e.to_string()))?;

        let mut history: Vec<Sample> = self
            .store
            .samples_in_range(start, end)?
            .into_iter()
            .filter(|s| s.component == component)
            .collect();

        let skip = history.len().saturating_sub(MAX_HISTORY_SAMPLES);
        history.drain(..skip);

        let Some(current) = history.last().cloned() else {
            return Err(MonitorError::NoSamples {
                component: component.to_string(),
                window_secs: window.as_secs(),
            });
        };

        debug!(
            component = %component,
            history_len = history.len(),
            "Running store-backed diagnosis"
        );
        Ok(self.analyze(&current, &history))
    }

    /// Edges of the dependency graph for the disks visible now
    pub fn topology(&self) -> Result<Vec<DependencyEdge>, MonitorError> {
        Ok(self.resolver.topology()?.edges())
    }

    /// Disks the collector can see now, in mount order
    pub fn disks(&self) -> Result<Vec<DiskInfo>, MonitorError> {
        Ok(self.collector.list_disks()?)
    }

    /// Newest sample of every component
    pub fn latest(&self) -> Result<Vec<Sample>, MonitorError> {
        Ok(self.store.latest_per_component()?)
    }

    /// Newest `count` samples, newest first
    pub fn recent(&self, count: usize) -> Result<Vec<Sample>, MonitorError> {
        Ok(self.store.recent(count)?)
    }
}

fn diagnosis_label(kind: crate::models::DiagnosisKind) -> String {
    serde_json::to_value(kind)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| kind.to_string())
}

fn validate(sample: &Sample) -> Result<(), MonitorError> {
    if sample.component.trim().is_empty() {
        return Err(MonitorError::InvalidSample(
            "component name must not be empty".into(),
        ));
    }

    let numeric = [
        ("cpu_percent", sample.cpu_percent),
        ("mem_percent", sample.mem_percent),
        ("disk_used_gb", sample.disk_used_gb),
        ("network_rate_mbps", sample.network_rate_mbps),
    ];
    for (field, value) in numeric {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(MonitorError::InvalidSample(format!(
                    "{field} must be a non-negative number"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertLevel, DiagnosisKind};
    use crate::store::InMemoryMetricStore;
    use chrono::Duration as ChronoDuration;

    struct StaticCollector;

    impl MetricsCollector for StaticCollector {
        fn collect(&self) -> Result<Vec<Sample>, CollectionError> {
            Ok(Vec::new())
        }

        fn list_disks(&self) -> Result<Vec<DiskInfo>, CollectionError> {
            Ok(vec![DiskInfo {
                name: "sda1".into(),
                mount_point: "/data".into(),
                total_gb: 1000.0,
                used_gb: 120.0,
                free_gb: 880.0,
                usage_percent: 12.0,
                file_system: "ext4".into(),
            }])
        }
    }

    fn service() -> MonitorService {
        MonitorService::new(
            Arc::new(InMemoryMetricStore::new()),
            Arc::new(StaticCollector),
            Arc::new(BaselineStore::new()),
            StructuredLogger::new("test-node"),
        )
    }

    #[test]
    fn test_ingest_stores_and_checks() {
        let service = service();
        let decision = service
            .ingest(Sample::new("checkout", Utc::now()).with_cpu(95.0).with_memory(40.0))
            .unwrap()
            .unwrap();

        assert!(decision.need_alert);
        assert_eq!(decision.level, AlertLevel::Warning);
        assert!(service.store().latest_sample("checkout").unwrap().is_some());
        assert!(service.baselines().get("checkout").is_some());
    }

    #[test]
    fn test_ingest_without_cpu_or_memory_skips_check() {
        let service = service();
        let decision = service
            .ingest(Sample::new("Disk-data", Utc::now()).with_disk_used(120.0))
            .unwrap();

        assert!(decision.is_none());
        assert!(service.baselines().is_empty());
    }

    #[test]
    fn test_ingest_rejects_invalid_samples() {
        let service = service();

        let err = service.ingest(Sample::new("  ", Utc::now())).unwrap_err();
        assert!(matches!(err, MonitorError::InvalidSample(_)));

        let err = service
            .ingest(Sample::new("CPU", Utc::now()).with_cpu(f64::NAN))
            .unwrap_err();
        assert!(err.to_string().contains("cpu_percent"));
    }

    #[test]
    fn test_diagnose_from_store() {
        let service = service();
        let now = Utc::now();
        for (i, mem) in [50.0, 55.0, 60.0, 65.0, 70.0, 96.0].iter().enumerate() {
            let at = now - ChronoDuration::minutes(6 - i as i64);
            service
                .ingest(Sample::new("Memory", at).with_memory(*mem))
                .unwrap();
        }
        // other components do not leak into the history
        service
            .ingest(Sample::new("CPU", now).with_cpu(10.0))
            .unwrap();

        let analysis = service
            .diagnose("Memory", Duration::from_secs(3600))
            .unwrap();
        let memory = analysis
            .diagnoses
            .iter()
            .find(|d| d.kind == DiagnosisKind::MemoryLeakRisk)
            .unwrap();
        assert_eq!(memory.confidence, 75);
    }

    #[test]
    fn test_diagnose_without_samples() {
        let service = service();
        let err = service
            .diagnose("Memory", Duration::from_secs(60))
            .unwrap_err();
        assert!(matches!(err, MonitorError::NoSamples { .. }));
    }

    #[test]
    fn test_root_cause_and_topology() {
        let service = service();
        service
            .ingest(Sample::new("CPU", Utc::now()).with_cpu(90.0))
            .unwrap();
        service
            .ingest(Sample::new("Memory", Utc::now()).with_memory(50.0))
            .unwrap();

        let result = service.analyze_root_cause("Disk-data");
        assert_eq!(result.dependency_chain, vec!["Memory", "CPU"]);
        assert!(result.confidence <= 0.95);

        let edges = service.topology().unwrap();
        assert!(edges
            .iter()
            .any(|e| e.component == "Processes" && e.depends_on == "Disk-data"));
    }

    #[test]
    fn test_disks_lists_collector_inventory() {
        let disks = service().disks().unwrap();

        assert_eq!(disks.len(), 1);
        assert_eq!(disks[0].mount_point, "/data");
        assert_eq!(disks[0].component_key(), "Disk-data");
    }

    #[test]
    fn test_diagnosis_label() {
        assert_eq!(diagnosis_label(DiagnosisKind::DiskSpaceRisk), "disk_space_risk");
    }
}
