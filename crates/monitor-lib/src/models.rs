//! Core data models for the component monitor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Key of the CPU component
pub const CPU: &str = "CPU";
/// Key of the memory component
pub const MEMORY: &str = "Memory";
/// Key of the network component
pub const NETWORK: &str = "Network";
/// Key of the process-table component
pub const PROCESSES: &str = "Processes";

/// The four components that exist on every host, in analysis order
pub const CORE_COMPONENTS: [&str; 4] = [CPU, MEMORY, NETWORK, PROCESSES];

/// Prefix shared by every synthesized disk component key
pub const DISK_KEY_PREFIX: &str = "Disk-";

/// One resource-usage observation for a named component.
///
/// Only the fields that make sense for the component are populated. A `None`
/// field means "not applicable", never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub component: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_used_gb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_rate_mbps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
}

impl Sample {
    /// Create an empty sample for `component` at `timestamp`
    pub fn new(component: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            component: component.into(),
            timestamp,
            cpu_percent: None,
            mem_percent: None,
            disk_used_gb: None,
            network_rate_mbps: None,
            process_count: None,
            response_time_ms: None,
        }
    }

    pub fn with_cpu(mut self, percent: f64) -> Self {
        self.cpu_percent = Some(percent);
        self
    }

    pub fn with_memory(mut self, percent: f64) -> Self {
        self.mem_percent = Some(percent);
        self
    }

    pub fn with_disk_used(mut self, gb: f64) -> Self {
        self.disk_used_gb = Some(gb);
        self
    }

    pub fn with_network_rate(mut self, mbps: f64) -> Self {
        self.network_rate_mbps = Some(mbps);
        self
    }

    pub fn with_process_count(mut self, count: u32) -> Self {
        self.process_count = Some(count);
        self
    }

    pub fn with_response_time(mut self, ms: u64) -> Self {
        self.response_time_ms = Some(ms);
        self
    }
}

/// Capacity information for one mounted volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskInfo {
    pub name: String,
    pub mount_point: String,
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
    pub usage_percent: f64,
    pub file_system: String,
}

impl DiskInfo {
    /// Component key under which this volume is analyzed
    pub fn component_key(&self) -> String {
        disk_component_key(&self.mount_point)
    }

    /// Sample describing this volume at `timestamp`
    pub fn to_sample(&self, timestamp: DateTime<Utc>) -> Sample {
        Sample::new(self.component_key(), timestamp).with_disk_used(self.used_gb)
    }
}

/// Build a disk component key from a mount label.
///
/// Path separators and drive colons are stripped, so `C:\` becomes `Disk-C`
/// and `/home` becomes `Disk-home`. The bare root mount maps to `Disk-root`.
pub fn disk_component_key(mount_point: &str) -> String {
    let label: String = mount_point
        .chars()
        .filter(|c| !matches!(c, ':' | '/' | '\\'))
        .collect();

    if label.is_empty() {
        format!("{}root", DISK_KEY_PREFIX)
    } else {
        format!("{}{}", DISK_KEY_PREFIX, label)
    }
}

/// Returns true if `key` names a disk instance
pub fn is_disk_key(key: &str) -> bool {
    key.starts_with(DISK_KEY_PREFIX)
}

/// Display suffix of a disk key (`Disk-C` -> `C`)
pub fn disk_suffix(key: &str) -> &str {
    key.strip_prefix(DISK_KEY_PREFIX).unwrap_or(key)
}

/// Capability classification of a component key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Cpu,
    Memory,
    Network,
    Processes,
    Disk,
    Other,
}

impl ComponentKind {
    pub fn from_key(key: &str) -> Self {
        match key {
            CPU => ComponentKind::Cpu,
            MEMORY => ComponentKind::Memory,
            NETWORK => ComponentKind::Network,
            PROCESSES => ComponentKind::Processes,
            k if is_disk_key(k) => ComponentKind::Disk,
            _ => ComponentKind::Other,
        }
    }
}

/// Alert level produced by the threshold detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    Normal,
    Warning,
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertLevel::Normal => write!(f, "NORMAL"),
            AlertLevel::Warning => write!(f, "WARNING"),
        }
    }
}

/// Signals tracked by the baseline store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Cpu,
    Memory,
    ResponseTime,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Cpu => write!(f, "cpu"),
            Signal::Memory => write!(f, "memory"),
            Signal::ResponseTime => write!(f, "response_time"),
        }
    }
}

/// Outcome of checking one sample against its entity baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDecision {
    pub need_alert: bool,
    pub level: AlertLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<String>,
    /// Signals that exceeded their threshold, in cpu/memory/response order
    pub triggered: Vec<Signal>,
}

/// Category of a trend diagnosis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisKind {
    MemoryLeakRisk,
    CpuPerformanceIssue,
    DiskSpaceRisk,
}

impl std::fmt::Display for DiagnosisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosisKind::MemoryLeakRisk => write!(f, "Memory leak risk"),
            DiagnosisKind::CpuPerformanceIssue => write!(f, "CPU performance issue"),
            DiagnosisKind::DiskSpaceRisk => write!(f, "Disk space risk"),
        }
    }
}

/// A confidence-scored finding from the trend diagnoser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub kind: DiagnosisKind,
    /// Confidence 0-100
    pub confidence: u8,
    pub evidence: String,
}

impl Diagnosis {
    pub fn new(kind: DiagnosisKind, confidence: u8, evidence: impl Into<String>) -> Self {
        Self {
            kind,
            confidence,
            evidence: evidence.into(),
        }
    }
}

/// Result of one trend analysis call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub diagnoses: Vec<Diagnosis>,
    pub analysis_time: DateTime<Utc>,
}

/// Result of inferring the root cause of an anomaly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootCauseResult {
    pub affected_component: String,
    pub analyzed_components: Vec<String>,
    pub dependency_chain: Vec<String>,
    pub root_cause: String,
    /// Confidence 0.0-0.95
    pub confidence: f64,
    pub evidence: String,
    pub suggestions: Vec<String>,
    /// Correlation score per evaluated component
    pub correlations: std::collections::BTreeMap<String, f64>,
    pub analysis_time: DateTime<Utc>,
    /// Set when collaborators failed and the result is a best-effort fallback
    pub degraded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_component_key_strips_separators() {
        assert_eq!(disk_component_key("C:\\"), "Disk-C");
        assert_eq!(disk_component_key("D:"), "Disk-D");
        assert_eq!(disk_component_key("/home"), "Disk-home");
        assert_eq!(disk_component_key("/mnt/data"), "Disk-mntdata");
        assert_eq!(disk_component_key("/"), "Disk-root");
    }

    #[test]
    fn test_component_kind_from_key() {
        assert_eq!(ComponentKind::from_key("CPU"), ComponentKind::Cpu);
        assert_eq!(ComponentKind::from_key("Processes"), ComponentKind::Processes);
        assert_eq!(ComponentKind::from_key("Disk-C"), ComponentKind::Disk);
        assert_eq!(ComponentKind::from_key("order-service"), ComponentKind::Other);
        // keys are case sensitive
        assert_eq!(ComponentKind::from_key("cpu"), ComponentKind::Other);
    }

    #[test]
    fn test_disk_suffix() {
        assert_eq!(disk_suffix("Disk-C"), "C");
        assert_eq!(disk_suffix("Memory"), "Memory");
    }

    #[test]
    fn test_sample_omits_absent_fields() {
        let sample = Sample::new("CPU", Utc::now()).with_cpu(42.0);
        let json = serde_json::to_value(&sample).unwrap();

        assert_eq!(json["cpu_percent"], 42.0);
        assert!(json.get("mem_percent").is_none());
        assert!(json.get("process_count").is_none());
    }

    #[test]
    fn test_sample_deserializes_with_missing_fields() {
        let sample: Sample = serde_json::from_str(
            r#"{"component":"Memory","timestamp":"2024-01-01T00:00:00Z","mem_percent":71.5}"#,
        )
        .unwrap();

        assert_eq!(sample.mem_percent, Some(71.5));
        assert_eq!(sample.cpu_percent, None);
    }

    #[test]
    fn test_disk_info_to_sample() {
        let disk = DiskInfo {
            name: "nvme0n1p2".to_string(),
            mount_point: "/".to_string(),
            total_gb: 500.0,
            used_gb: 120.0,
            free_gb: 380.0,
            usage_percent: 24.0,
            file_system: "ext4".to_string(),
        };

        let sample = disk.to_sample(Utc::now());
        assert_eq!(sample.component, "Disk-root");
        assert_eq!(sample.disk_used_gb, Some(120.0));
        assert_eq!(sample.cpu_percent, None);
    }
}
