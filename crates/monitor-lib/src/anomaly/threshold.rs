//! Dynamic threshold detection
//!
//! Flags a signal when its current value exceeds `mean + 1.5 * std_dev` of the
//! entity baseline. Any flagged signal raises a WARNING for the entity.

use std::sync::Arc;

use tracing::{debug, warn};

use super::baseline::{Baseline, BaselineStore};
use crate::models::{AlertDecision, AlertLevel, Signal};

/// Number of standard deviations above the mean that counts as abnormal
pub const THRESHOLD_MULTIPLIER: f64 = 1.5;

/// Suggestions attached to every fired alert
pub const ALERT_SUGGESTIONS: &str =
    "Suggestions: 1. Check the service load 2. Check the status of dependent services 3. Contact the operations team";

/// Message returned when no signal is abnormal
pub const NORMAL_MESSAGE: &str = "Service is running normally";

/// Checks incoming samples against per-entity baselines
#[derive(Debug, Clone)]
pub struct ThresholdDetector {
    baselines: Arc<BaselineStore>,
}

impl ThresholdDetector {
    pub fn new(baselines: Arc<BaselineStore>) -> Self {
        Self { baselines }
    }

    /// Baseline store backing this detector
    pub fn baselines(&self) -> &Arc<BaselineStore> {
        &self.baselines
    }

    /// Decide whether the current values of `entity_key` warrant an alert.
    ///
    /// An entity seen for the first time is seeded with default baselines.
    /// A missing response time is not evaluated.
    pub fn check_alert(
        &self,
        entity_key: &str,
        cpu: f64,
        mem: f64,
        response_time_ms: Option<u64>,
    ) -> AlertDecision {
        let baseline = self.baselines.get_or_seed(entity_key);

        let readings = [
            (Signal::Cpu, Some(cpu)),
            (Signal::Memory, Some(mem)),
            (Signal::ResponseTime, response_time_ms.map(|ms| ms as f64)),
        ];

        let triggered: Vec<Signal> = readings
            .iter()
            .filter_map(|(signal, value)| {
                let value = (*value)?;
                is_anomalous(&baseline, *signal, value).then_some(*signal)
            })
            .collect();

        if triggered.is_empty() {
            return AlertDecision {
                need_alert: false,
                level: AlertLevel::Normal,
                message: NORMAL_MESSAGE.to_string(),
                suggestions: None,
                triggered,
            };
        }

        let message = alert_message(entity_key, &triggered);
        warn!(entity = %entity_key, signals = ?triggered, "{}", message);

        AlertDecision {
            need_alert: true,
            level: AlertLevel::Warning,
            message,
            suggestions: Some(ALERT_SUGGESTIONS.to_string()),
            triggered,
        }
    }
}

/// One-sided z-score rule for a single signal
fn is_anomalous(baseline: &Baseline, signal: Signal, value: f64) -> bool {
    let profile = baseline.signal(signal);
    let Some(threshold) = profile.threshold(THRESHOLD_MULTIPLIER) else {
        return false;
    };

    let anomalous = value > threshold;
    if anomalous {
        debug!(
            signal = %signal,
            value = value,
            threshold = threshold,
            mean = ?profile.mean,
            std_dev = ?profile.std_dev,
            "Signal above dynamic threshold"
        );
    }
    anomalous
}

fn alert_message(entity_key: &str, triggered: &[Signal]) -> String {
    let clauses: Vec<&str> = triggered
        .iter()
        .map(|signal| match signal {
            Signal::Cpu => "CPU usage outside normal range",
            Signal::Memory => "memory usage outside normal range",
            Signal::ResponseTime => "response time outside normal range",
        })
        .collect();

    format!(
        "Service [{}] anomaly detected: {}",
        entity_key,
        clauses.join("; ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::baseline::SignalBaseline;

    fn detector() -> ThresholdDetector {
        ThresholdDetector::new(Arc::new(BaselineStore::new()))
    }

    #[test]
    fn test_new_entity_normal_values() {
        let detector = detector();
        let decision = detector.check_alert("fresh-entity", 40.0, 40.0, Some(50));

        assert!(!decision.need_alert);
        assert_eq!(decision.level, AlertLevel::Normal);
        assert_eq!(decision.message, NORMAL_MESSAGE);
        assert!(decision.suggestions.is_none());
        assert_eq!(
            detector.baselines().get("fresh-entity"),
            Some(Baseline::default())
        );
    }

    #[test]
    fn test_cpu_threshold_boundary() {
        let detector = detector();

        let above = detector.check_alert("svc", 81.0, 40.0, Some(50));
        assert!(above.need_alert);
        assert_eq!(above.level, AlertLevel::Warning);
        assert_eq!(above.triggered, vec![Signal::Cpu]);

        let below = detector.check_alert("svc", 79.0, 40.0, Some(50));
        assert!(!below.need_alert);

        // threshold itself is not strictly greater
        let equal = detector.check_alert("svc", 80.0, 40.0, Some(50));
        assert!(!equal.need_alert);
    }

    #[test]
    fn test_memory_and_response_thresholds() {
        let detector = detector();

        // memory threshold 60 + 1.5 * 15 = 82.5
        let mem = detector.check_alert("svc", 10.0, 83.0, None);
        assert_eq!(mem.triggered, vec![Signal::Memory]);

        // response threshold 100 + 1.5 * 25 = 137.5
        let response = detector.check_alert("svc", 10.0, 10.0, Some(138));
        assert_eq!(response.triggered, vec![Signal::ResponseTime]);
        assert!(!detector.check_alert("svc", 10.0, 10.0, Some(137)).need_alert);
    }

    #[test]
    fn test_message_lists_signals_in_fixed_order() {
        let detector = detector();
        let decision = detector.check_alert("orders", 99.0, 99.0, Some(500));

        assert_eq!(
            decision.triggered,
            vec![Signal::Cpu, Signal::Memory, Signal::ResponseTime]
        );
        let cpu_pos = decision.message.find("CPU").unwrap();
        let mem_pos = decision.message.find("memory").unwrap();
        let resp_pos = decision.message.find("response time").unwrap();
        assert!(cpu_pos < mem_pos && mem_pos < resp_pos);
        assert!(decision.message.contains("[orders]"));
        assert_eq!(decision.suggestions.as_deref(), Some(ALERT_SUGGESTIONS));
    }

    #[test]
    fn test_missing_response_time_is_not_evaluated() {
        let detector = detector();
        let decision = detector.check_alert("svc", 10.0, 10.0, None);
        assert!(!decision.need_alert);
    }

    #[test]
    fn test_unknown_profile_short_circuits() {
        let store = Arc::new(BaselineStore::new());
        store.seed(
            "partial",
            Baseline {
                cpu: SignalBaseline::unknown(),
                memory: SignalBaseline {
                    mean: Some(60.0),
                    std_dev: None,
                },
                ..Baseline::default()
            },
        );
        let detector = ThresholdDetector::new(store);

        let decision = detector.check_alert("partial", 1000.0, 1000.0, Some(10));
        assert!(!decision.need_alert);
    }

    #[test]
    fn test_seeded_baseline_is_used() {
        let store = Arc::new(BaselineStore::new());
        store.seed(
            "user-service",
            Baseline {
                cpu: SignalBaseline::new(45.0, 15.0),
                memory: SignalBaseline::new(65.0, 10.0),
                response_time: SignalBaseline::new(120.0, 30.0),
            },
        );
        let detector = ThresholdDetector::new(store);

        // cpu threshold 67.5, memory threshold 80
        let decision = detector.check_alert("user-service", 70.0, 79.0, Some(100));
        assert_eq!(decision.triggered, vec![Signal::Cpu]);
    }
}
