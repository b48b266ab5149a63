//! Anomaly detection for component metrics
//!
//! This module provides:
//! - Per-entity baselines seeded on first observation
//! - Dynamic threshold alerts (mean + 1.5 standard deviations)
//! - Trend diagnoses over a short rolling history

mod baseline;
mod threshold;
mod trend;

pub use baseline::{
    Baseline, BaselineStore, SignalBaseline, DEFAULT_CPU_MEAN, DEFAULT_CPU_STD_DEV,
    DEFAULT_MEM_MEAN, DEFAULT_MEM_STD_DEV, DEFAULT_RESPONSE_MEAN, DEFAULT_RESPONSE_STD_DEV,
};
pub use threshold::{ThresholdDetector, ALERT_SUGGESTIONS, NORMAL_MESSAGE, THRESHOLD_MULTIPLIER};
pub use trend::{TrendDiagnoser, MAX_HISTORY_SAMPLES, MIN_REPORTED_CONFIDENCE};
