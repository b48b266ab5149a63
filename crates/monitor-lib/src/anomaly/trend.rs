//! Trend-based diagnosis
//!
//! Looks at a short rolling history of one component and scores three risks:
//! - Memory leak (growth between first and last sample plus average usage)
//! - CPU performance (average load and population standard deviation)
//! - Disk space (average and current disk usage)
//!
//! Each detector returns a confidence 0-100. Only findings above
//! [`MIN_REPORTED_CONFIDENCE`] are surfaced, always in memory/cpu/disk order.
//!
//! Samples that do not carry a signal are skipped for that signal. A missing
//! current value never satisfies a "current above" tier.

use chrono::Utc;
use tracing::debug;

use crate::models::{Diagnosis, DiagnosisKind, Sample, TrendAnalysis};

/// Diagnoses at or below this confidence are dropped
pub const MIN_REPORTED_CONFIDENCE: u8 = 40;

/// Upper bound on history entries considered by one analysis
pub const MAX_HISTORY_SAMPLES: usize = 120;

/// Minimum history length for the memory detector
const MIN_SAMPLES_FOR_MEMORY: usize = 3;

/// Stateless rolling-history diagnoser
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendDiagnoser;

impl TrendDiagnoser {
    pub fn new() -> Self {
        Self
    }

    /// Diagnose `current` against `history` (oldest first).
    ///
    /// Only the newest [`MAX_HISTORY_SAMPLES`] entries of `history` are used.
    pub fn analyze(&self, current: &Sample, history: &[Sample]) -> TrendAnalysis {
        let history = bounded(history);

        let diagnoses: Vec<Diagnosis> = [
            detect_memory_leak(current, history),
            detect_cpu_issue(current, history),
            detect_disk_issue(current, history),
        ]
        .into_iter()
        .filter(|d| d.confidence > MIN_REPORTED_CONFIDENCE)
        .collect();

        debug!(
            component = %current.component,
            history_len = history.len(),
            findings = diagnoses.len(),
            "Trend analysis complete"
        );

        TrendAnalysis {
            diagnoses,
            analysis_time: Utc::now(),
        }
    }
}

fn bounded(history: &[Sample]) -> &[Sample] {
    let skip = history.len().saturating_sub(MAX_HISTORY_SAMPLES);
    &history[skip..]
}

fn detect_memory_leak(current: &Sample, history: &[Sample]) -> Diagnosis {
    let kind = DiagnosisKind::MemoryLeakRisk;
    if history.len() < MIN_SAMPLES_FOR_MEMORY {
        return Diagnosis::new(kind, 0, "insufficient history");
    }

    let values: Vec<f64> = history.iter().filter_map(|s| s.mem_percent).collect();
    let growth = growth(&values);
    let avg = mean(&values);

    if growth > 1.5 && avg > 80.0 {
        Diagnosis::new(
            kind,
            85,
            format!(
                "Memory growing fast ({:.1}%), average usage {:.1}%",
                growth, avg
            ),
        )
    } else if growth > 0.8 && avg > 70.0 {
        Diagnosis::new(
            kind,
            65,
            format!("Memory growing steadily ({:.1}%), usage elevated", growth),
        )
    } else if above(current.mem_percent, 90.0) {
        Diagnosis::new(kind, 75, "Memory usage above 90%")
    } else {
        Diagnosis::new(kind, 0, "memory usage normal")
    }
}

fn detect_cpu_issue(current: &Sample, history: &[Sample]) -> Diagnosis {
    let kind = DiagnosisKind::CpuPerformanceIssue;
    let values: Vec<f64> = history.iter().filter_map(|s| s.cpu_percent).collect();
    let avg = mean(&values);
    let volatility = std_dev(&values);

    if above(current.cpu_percent, 95.0) {
        Diagnosis::new(kind, 90, "CPU usage above 95%")
    } else if avg > 85.0 && volatility < 10.0 {
        Diagnosis::new(
            kind,
            75,
            format!("CPU sustained high load (avg {:.1}%), low volatility", avg),
        )
    } else if avg > 80.0 {
        Diagnosis::new(kind, 60, format!("CPU load elevated (avg {:.1}%)", avg))
    } else {
        Diagnosis::new(kind, 0, "CPU usage normal")
    }
}

fn detect_disk_issue(current: &Sample, history: &[Sample]) -> Diagnosis {
    let kind = DiagnosisKind::DiskSpaceRisk;
    let values: Vec<f64> = history.iter().filter_map(|s| s.disk_used_gb).collect();
    let avg = mean(&values);

    if above(current.disk_used_gb, 95.0) {
        Diagnosis::new(kind, 95, "Disk usage above 95")
    } else if avg > 90.0 {
        Diagnosis::new(
            kind,
            80,
            format!("Disk usage persistently high (avg {:.1})", avg),
        )
    } else if above(current.disk_used_gb, 85.0) {
        Diagnosis::new(kind, 65, "Disk usage elevated")
    } else {
        Diagnosis::new(kind, 0, "disk usage normal")
    }
}

fn above(value: Option<f64>, limit: f64) -> bool {
    value.is_some_and(|v| v > limit)
}

/// Last minus first value, 0 with fewer than two values
fn growth(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(first), Some(last)) if values.len() >= 2 => last - first,
        _ => 0.0,
    }
}

/// Arithmetic mean, 0 for an empty slice
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation, 0 for an empty slice
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn memory_series(values: &[f64]) -> Vec<Sample> {
        let start = Utc::now() - Duration::minutes(values.len() as i64);
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                Sample::new("Memory", start + Duration::minutes(i as i64)).with_memory(*v)
            })
            .collect()
    }

    fn cpu_series(values: &[f64]) -> Vec<Sample> {
        values
            .iter()
            .map(|v| Sample::new("CPU", Utc::now()).with_cpu(*v))
            .collect()
    }

    fn find(analysis: &TrendAnalysis, kind: DiagnosisKind) -> Option<&Diagnosis> {
        analysis.diagnoses.iter().find(|d| d.kind == kind)
    }

    #[test]
    fn test_memory_spike_is_reported() {
        let history = memory_series(&[50.0, 55.0, 60.0, 65.0, 70.0, 96.0]);
        let current = Sample::new("Memory", Utc::now()).with_memory(96.0);

        let analysis = TrendDiagnoser::new().analyze(&current, &history);
        let memory = find(&analysis, DiagnosisKind::MemoryLeakRisk).unwrap();
        assert!(memory.confidence >= 75);
    }

    #[test]
    fn test_short_history_memory_is_zero_and_excluded() {
        let history = memory_series(&[95.0, 96.0]);
        let current = Sample::new("Memory", Utc::now()).with_memory(99.0);

        let memory = detect_memory_leak(&current, &history);
        assert_eq!(memory.confidence, 0);
        assert_eq!(memory.evidence, "insufficient history");

        let analysis = TrendDiagnoser::new().analyze(&current, &history);
        assert!(find(&analysis, DiagnosisKind::MemoryLeakRisk).is_none());
    }

    #[test]
    fn test_memory_tiers() {
        let current = Sample::new("Memory", Utc::now()).with_memory(50.0);

        let fast = detect_memory_leak(&current, &memory_series(&[81.0, 82.0, 83.0]));
        assert_eq!(fast.confidence, 85);
        assert!(fast.evidence.contains("2.0%"));

        let steady = detect_memory_leak(&current, &memory_series(&[71.0, 71.5, 72.0]));
        assert_eq!(steady.confidence, 65);

        let normal = detect_memory_leak(&current, &memory_series(&[40.0, 40.0, 40.0]));
        assert_eq!(normal.confidence, 0);
        assert_eq!(normal.evidence, "memory usage normal");
    }

    #[test]
    fn test_cpu_tiers() {
        let hot = Sample::new("CPU", Utc::now()).with_cpu(97.0);
        assert_eq!(detect_cpu_issue(&hot, &[]).confidence, 90);

        let calm = Sample::new("CPU", Utc::now()).with_cpu(50.0);
        let sustained = detect_cpu_issue(&calm, &cpu_series(&[88.0, 89.0, 90.0]));
        assert_eq!(sustained.confidence, 75);

        // volatility above 10 drops to the elevated tier
        let jumpy = detect_cpu_issue(&calm, &cpu_series(&[75.0, 100.0, 75.0, 100.0]));
        assert_eq!(jumpy.confidence, 60);

        let idle = detect_cpu_issue(&calm, &cpu_series(&[10.0, 20.0]));
        assert_eq!(idle.confidence, 0);
    }

    #[test]
    fn test_disk_tiers() {
        let history: Vec<Sample> = [91.0, 92.0, 93.0]
            .iter()
            .map(|v| Sample::new("Disk-C", Utc::now()).with_disk_used(*v))
            .collect();

        let full = Sample::new("Disk-C", Utc::now()).with_disk_used(96.0);
        assert_eq!(detect_disk_issue(&full, &history).confidence, 95);

        let steady = Sample::new("Disk-C", Utc::now()).with_disk_used(92.0);
        assert_eq!(detect_disk_issue(&steady, &history).confidence, 80);

        let rising = Sample::new("Disk-C", Utc::now()).with_disk_used(86.0);
        assert_eq!(detect_disk_issue(&rising, &[]).confidence, 65);
    }

    #[test]
    fn test_missing_fields_are_skipped() {
        // cpu-only history: memory growth and average are both 0
        let history = cpu_series(&[10.0, 10.0, 10.0]);
        let current = Sample::new("CPU", Utc::now());

        let memory = detect_memory_leak(&current, &history);
        assert_eq!(memory.confidence, 0);

        // a missing current value never satisfies the "current above" tiers
        assert_eq!(detect_cpu_issue(&Sample::new("CPU", Utc::now()), &[]).confidence, 0);
        assert_eq!(detect_disk_issue(&current, &history).confidence, 0);

        // one gap inside the series is excluded from the average
        let mut mixed = memory_series(&[82.0, 83.0, 84.0]);
        mixed.insert(1, Sample::new("Memory", Utc::now()));
        let leak = detect_memory_leak(&current, &mixed);
        assert_eq!(leak.confidence, 85);
    }

    #[test]
    fn test_output_order_and_filter() {
        let history: Vec<Sample> = (0..5)
            .map(|i| {
                Sample::new("host", Utc::now())
                    .with_memory(85.0 + i as f64)
                    .with_cpu(90.0)
                    .with_disk_used(92.0)
            })
            .collect();
        let current = Sample::new("host", Utc::now())
            .with_memory(90.0)
            .with_cpu(90.0)
            .with_disk_used(92.0);

        let analysis = TrendDiagnoser::new().analyze(&current, &history);
        let kinds: Vec<DiagnosisKind> = analysis.diagnoses.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiagnosisKind::MemoryLeakRisk,
                DiagnosisKind::CpuPerformanceIssue,
                DiagnosisKind::DiskSpaceRisk
            ]
        );
        assert!(analysis.diagnoses.iter().all(|d| d.confidence > 40));
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let history = memory_series(&[50.0, 55.0, 60.0, 65.0, 70.0, 96.0]);
        let current = Sample::new("Memory", Utc::now()).with_memory(96.0);
        let diagnoser = TrendDiagnoser::new();

        let first = diagnoser.analyze(&current, &history);
        let second = diagnoser.analyze(&current, &history);
        assert_eq!(first.diagnoses, second.diagnoses);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut values = vec![10.0; MAX_HISTORY_SAMPLES];
        values.insert(0, 99.0);
        let history = memory_series(&values);

        assert_eq!(bounded(&history).len(), MAX_HISTORY_SAMPLES);
        assert_eq!(bounded(&history)[0].mem_percent, Some(10.0));
    }

    #[test]
    fn test_population_std_dev() {
        assert_eq!(std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0);
        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(growth(&[5.0]), 0.0);
    }
}
