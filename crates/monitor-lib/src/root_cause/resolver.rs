//! Root-cause inference over the dependency topology
//!
//! For an affected component the resolver gathers the newest sample of every
//! core component plus one synthesized sample per visible disk, walks the
//! dependency chain and scores each candidate by how far it sits above its
//! component baseline. The highest score names the root cause.
//!
//! Collaborator failures never surface to the caller. They produce a degraded
//! result that points at the affected component itself.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::topology::DependencyTopology;
use crate::collector::{CollectionError, MetricsCollector};
use crate::models::{disk_suffix, ComponentKind, RootCauseResult, Sample, CORE_COMPONENTS};
use crate::store::{MetricStore, StoreError};

/// Component baselines used for correlation scoring
pub const CPU_BASELINE: f64 = 70.0;
pub const MEMORY_BASELINE: f64 = 75.0;
pub const NETWORK_BASELINE: f64 = 50.0;
pub const PROCESSES_BASELINE: f64 = 200.0;
pub const DISK_BASELINE: f64 = 80.0;
/// Baseline for any key outside the known component kinds
pub const DEFAULT_BASELINE: f64 = 70.0;

/// Disk used space (GB) above which a disk counts as abnormal
pub const DISK_ABNORMAL_USED_GB: f64 = 100.0;

/// Upper bound of a reported confidence
pub const MAX_CONFIDENCE: f64 = 0.95;

/// Confidence of a degraded result
pub const FALLBACK_CONFIDENCE: f64 = 0.6;

const NO_ANOMALY_EVIDENCE: &str = "No obvious anomaly found";
const NORMAL_SUGGESTION: &str = "System running normally";

/// How disk correlation is scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiskCorrelation {
    /// Score derived from the disk baseline alone; every disk scores the same
    #[default]
    BaselineOnly,
    /// Score derived from the observed used space above the baseline
    Observed,
}

#[derive(Debug, thiserror::Error)]
enum GatherError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Collection(#[from] CollectionError),
}

/// Snapshot of every component the resolver can see
struct Observation {
    samples: HashMap<String, Sample>,
    /// Observed keys, core components first then disks in mount order
    order: Vec<String>,
    disk_keys: Vec<String>,
}

/// Infers the most likely upstream cause of an anomaly
pub struct RootCauseResolver {
    store: Arc<dyn MetricStore>,
    collector: Arc<dyn MetricsCollector>,
    disk_correlation: DiskCorrelation,
}

impl RootCauseResolver {
    pub fn new(store: Arc<dyn MetricStore>, collector: Arc<dyn MetricsCollector>) -> Self {
        Self {
            store,
            collector,
            disk_correlation: DiskCorrelation::default(),
        }
    }

    pub fn with_disk_correlation(mut self, mode: DiskCorrelation) -> Self {
        self.disk_correlation = mode;
        self
    }

    pub fn disk_correlation(&self) -> DiskCorrelation {
        self.disk_correlation
    }

    /// Current dependency graph, including the disks visible right now
    pub fn topology(&self) -> Result<DependencyTopology, CollectionError> {
        let disks = self.collector.list_disks()?;
        Ok(DependencyTopology::new(
            disks.iter().map(|d| d.component_key()),
        ))
    }

    /// Infer the root cause of an anomaly seen on `affected`.
    ///
    /// Never fails: collaborator errors yield a degraded result.
    pub fn analyze_root_cause(&self, affected: &str) -> RootCauseResult {
        match self.observe() {
            Ok(observation) => self.resolve(affected, &observation),
            Err(e) => {
                warn!(
                    affected = %affected,
                    error = %e,
                    "Root cause analysis degraded, collaborator failed"
                );
                fallback(affected, &e.to_string())
            }
        }
    }

    fn observe(&self) -> Result<Observation, GatherError> {
        let mut samples = HashMap::new();
        let mut order = Vec::new();

        for component in CORE_COMPONENTS {
            if let Some(sample) = self.store.latest_sample(component)? {
                samples.insert(component.to_string(), sample);
                order.push(component.to_string());
            }
        }

        let now = Utc::now();
        let mut disk_keys = Vec::new();
        for disk in self.collector.list_disks()? {
            let key = disk.component_key();
            if samples.contains_key(&key) {
                warn!(
                    component = %key,
                    mount_point = %disk.mount_point,
                    "Disk key already observed, keeping the first mount"
                );
                continue;
            }
            samples.insert(key.clone(), disk.to_sample(now));
            order.push(key.clone());
            disk_keys.push(key);
        }

        Ok(Observation {
            samples,
            order,
            disk_keys,
        })
    }

    fn resolve(&self, affected: &str, observation: &Observation) -> RootCauseResult {
        let topology = DependencyTopology::new(observation.disk_keys.iter().cloned());
        let chain = topology.dependency_chain(affected, |key| observation.samples.contains_key(key));

        let mut correlations = BTreeMap::new();
        let mut evidence = Vec::new();
        let mut suggestions = Vec::new();
        let mut root_cause = affected.to_string();
        let mut max_correlation = 0.0_f64;

        for component in &chain {
            let Some(sample) = observation.samples.get(component) else {
                continue;
            };
            let correlation = self.correlation(component, sample);
            correlations.insert(component.clone(), correlation);

            // later components win ties above zero
            if correlation > max_correlation || (correlation == max_correlation && correlation > 0.0)
            {
                max_correlation = correlation;
                root_cause = component.clone();
            }

            if let Some(text) = abnormal_evidence(component, sample) {
                evidence.push(text);
                suggestions.push(suggestion_for(component));
            }
        }

        if let Some(sample) = observation.samples.get(affected) {
            let correlation = self.correlation(affected, sample);
            correlations.insert(affected.to_string(), correlation);

            if correlation >= max_correlation {
                max_correlation = correlation;
                root_cause = affected.to_string();
            }

            if let Some(text) = abnormal_evidence(affected, sample) {
                evidence.push(text);
                suggestions.push(suggestion_for(affected));
            }
        }

        let confidence = (max_correlation * 1.2).min(MAX_CONFIDENCE);

        debug!(
            affected = %affected,
            root_cause = %root_cause,
            chain = ?chain,
            confidence = confidence,
            "Root cause resolved"
        );

        RootCauseResult {
            affected_component: affected.to_string(),
            analyzed_components: observation.order.clone(),
            dependency_chain: chain,
            root_cause,
            confidence,
            evidence: if evidence.is_empty() {
                NO_ANOMALY_EVIDENCE.to_string()
            } else {
                evidence.join("; ")
            },
            suggestions: if suggestions.is_empty() {
                vec![NORMAL_SUGGESTION.to_string()]
            } else {
                suggestions
            },
            correlations,
            analysis_time: Utc::now(),
            degraded: false,
        }
    }

    /// Deviation above baseline, doubled and capped at 1
    fn correlation(&self, component: &str, sample: &Sample) -> f64 {
        let baseline = baseline_for(component);
        let deviation = match ComponentKind::from_key(component) {
            ComponentKind::Cpu => sample
                .cpu_percent
                .map_or(0.0, |v| (v - baseline).max(0.0) / 100.0),
            ComponentKind::Memory => sample
                .mem_percent
                .map_or(0.0, |v| (v - baseline).max(0.0) / 100.0),
            ComponentKind::Processes => sample
                .process_count
                .map_or(0.0, |v| (f64::from(v) - baseline).max(0.0) / 300.0),
            ComponentKind::Disk => match (self.disk_correlation, sample.disk_used_gb) {
                (DiskCorrelation::BaselineOnly, Some(_)) => ((baseline - 50.0) / 50.0).max(0.0),
                (DiskCorrelation::Observed, Some(used)) => (used - baseline).max(0.0) / 100.0,
                (_, None) => 0.0,
            },
            ComponentKind::Network | ComponentKind::Other => 0.0,
        };

        (deviation * 2.0).min(1.0)
    }
}

/// Component-level baseline for correlation and abnormality checks
pub fn baseline_for(component: &str) -> f64 {
    match ComponentKind::from_key(component) {
        ComponentKind::Cpu => CPU_BASELINE,
        ComponentKind::Memory => MEMORY_BASELINE,
        ComponentKind::Network => NETWORK_BASELINE,
        ComponentKind::Processes => PROCESSES_BASELINE,
        ComponentKind::Disk => DISK_BASELINE,
        ComponentKind::Other => DEFAULT_BASELINE,
    }
}

/// Evidence text if `sample` is abnormal for its component
fn abnormal_evidence(component: &str, sample: &Sample) -> Option<String> {
    let baseline = baseline_for(component);
    match ComponentKind::from_key(component) {
        ComponentKind::Cpu => sample
            .cpu_percent
            .filter(|v| *v > baseline)
            .map(|v| format!("CPU usage too high: {:.1}%", v)),
        ComponentKind::Memory => sample
            .mem_percent
            .filter(|v| *v > baseline)
            .map(|v| format!("Memory usage too high: {:.1}%", v)),
        ComponentKind::Processes => sample
            .process_count
            .filter(|v| f64::from(*v) > baseline)
            .map(|v| format!("Too many processes: {}", v)),
        ComponentKind::Disk => sample
            .disk_used_gb
            .filter(|v| *v > DISK_ABNORMAL_USED_GB)
            .map(|v| format!("Disk {} usage: {:.0}GB", disk_suffix(component), v)),
        // throughput is scored but never reported as abnormal
        ComponentKind::Network | ComponentKind::Other => None,
    }
}

fn suggestion_for(component: &str) -> String {
    match ComponentKind::from_key(component) {
        ComponentKind::Cpu => "Close unnecessary applications to reduce CPU load".to_string(),
        ComponentKind::Memory => "Free memory and close unused programs".to_string(),
        ComponentKind::Processes => "Terminate unnecessary background processes".to_string(),
        ComponentKind::Disk => format!(
            "Clean up {} disk space and delete temporary files",
            disk_suffix(component)
        ),
        ComponentKind::Network | ComponentKind::Other => format!("Check {} status", component),
    }
}

fn fallback(affected: &str, error: &str) -> RootCauseResult {
    RootCauseResult {
        affected_component: affected.to_string(),
        analyzed_components: CORE_COMPONENTS.iter().map(|c| c.to_string()).collect(),
        dependency_chain: Vec::new(),
        root_cause: affected.to_string(),
        confidence: FALLBACK_CONFIDENCE,
        evidence: format!("Analysis service temporarily unavailable: {}", error),
        suggestions: vec![
            format!("Check {} resource usage", affected),
            "Restart related services".to_string(),
        ],
        correlations: BTreeMap::new(),
        analysis_time: Utc::now(),
        degraded: true,
    }
}
