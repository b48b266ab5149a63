//! Per-entity baseline profiles
//!
//! Each monitored entity gets a mean/standard deviation pair for CPU, memory
//! and response time. Entities are discovered rather than pre-registered: the
//! first lookup of an unknown key seeds it with fixed defaults. Seeded values
//! are never updated afterwards.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Signal;

/// Default CPU mean (%) for an unseen entity
pub const DEFAULT_CPU_MEAN: f64 = 50.0;
/// Default CPU standard deviation for an unseen entity
pub const DEFAULT_CPU_STD_DEV: f64 = 20.0;
/// Default memory mean (%) for an unseen entity
pub const DEFAULT_MEM_MEAN: f64 = 60.0;
/// Default memory standard deviation for an unseen entity
pub const DEFAULT_MEM_STD_DEV: f64 = 15.0;
/// Default response time mean (ms) for an unseen entity
pub const DEFAULT_RESPONSE_MEAN: f64 = 100.0;
/// Default response time standard deviation for an unseen entity
pub const DEFAULT_RESPONSE_STD_DEV: f64 = 25.0;

/// Mean and standard deviation of one signal.
///
/// Either half may be absent, in which case the signal cannot be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalBaseline {
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
}

impl SignalBaseline {
    pub fn new(mean: f64, std_dev: f64) -> Self {
        Self {
            mean: Some(mean),
            std_dev: Some(std_dev),
        }
    }

    /// A signal with no reference profile
    pub fn unknown() -> Self {
        Self {
            mean: None,
            std_dev: None,
        }
    }

    /// Alert threshold `mean + multiplier * std_dev`, if both halves are known
    pub fn threshold(&self, multiplier: f64) -> Option<f64> {
        match (self.mean, self.std_dev) {
            (Some(mean), Some(std_dev)) => Some(mean + multiplier * std_dev),
            _ => None,
        }
    }
}

/// Baseline profile of one entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub cpu: SignalBaseline,
    pub memory: SignalBaseline,
    pub response_time: SignalBaseline,
}

impl Baseline {
    pub fn signal(&self, signal: Signal) -> &SignalBaseline {
        match signal {
            Signal::Cpu => &self.cpu,
            Signal::Memory => &self.memory,
            Signal::ResponseTime => &self.response_time,
        }
    }
}

impl Default for Baseline {
    fn default() -> Self {
        Self {
            cpu: SignalBaseline::new(DEFAULT_CPU_MEAN, DEFAULT_CPU_STD_DEV),
            memory: SignalBaseline::new(DEFAULT_MEM_MEAN, DEFAULT_MEM_STD_DEV),
            response_time: SignalBaseline::new(DEFAULT_RESPONSE_MEAN, DEFAULT_RESPONSE_STD_DEV),
        }
    }
}

/// Thread-safe map of entity key to baseline.
///
/// Callers own the store and share it through an `Arc`. Insertion of an
/// unseen key happens under the shard write lock, so concurrent first lookups
/// of the same key create exactly one baseline.
#[derive(Debug, Default)]
pub struct BaselineStore {
    baselines: DashMap<String, Baseline>,
}

impl BaselineStore {
    pub fn new() -> Self {
        Self {
            baselines: DashMap::new(),
        }
    }

    /// Return the baseline for `key`, seeding it with defaults if unseen
    pub fn get_or_seed(&self, key: &str) -> Baseline {
        if let Some(existing) = self.baselines.get(key) {
            return *existing;
        }

        *self
            .baselines
            .entry(key.to_string())
            .or_insert_with(|| {
                debug!(entity = %key, "Seeding default baseline for new entity");
                Baseline::default()
            })
    }

    /// Register a configured baseline for `key` unless one already exists.
    ///
    /// Returns false if the key was already known.
    pub fn seed(&self, key: impl Into<String>, baseline: Baseline) -> bool {
        let mut inserted = false;
        self.baselines.entry(key.into()).or_insert_with(|| {
            inserted = true;
            baseline
        });
        inserted
    }

    /// Baseline for `key` without seeding
    pub fn get(&self, key: &str) -> Option<Baseline> {
        self.baselines.get(key).map(|r| *r)
    }

    /// Keys of all known entities, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.baselines.iter().map(|r| r.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_unseen_entity_gets_defaults() {
        let store = BaselineStore::new();
        let baseline = store.get_or_seed("checkout");

        assert_eq!(baseline.cpu, SignalBaseline::new(50.0, 20.0));
        assert_eq!(baseline.memory, SignalBaseline::new(60.0, 15.0));
        assert_eq!(baseline.response_time, SignalBaseline::new(100.0, 25.0));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_seed_does_not_overwrite() {
        let store = BaselineStore::new();
        let custom = Baseline {
            cpu: SignalBaseline::new(45.0, 15.0),
            ..Baseline::default()
        };

        assert!(store.seed("user-service", custom));
        assert!(!store.seed("user-service", Baseline::default()));
        assert_eq!(store.get_or_seed("user-service").cpu.mean, Some(45.0));
    }

    #[test]
    fn test_get_does_not_seed() {
        let store = BaselineStore::new();
        assert!(store.get("ghost").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_threshold_requires_both_halves() {
        assert_eq!(SignalBaseline::new(50.0, 20.0).threshold(1.5), Some(80.0));
        assert_eq!(SignalBaseline::unknown().threshold(1.5), None);

        let half = SignalBaseline {
            mean: Some(50.0),
            std_dev: None,
        };
        assert_eq!(half.threshold(1.5), None);
    }

    #[test]
    fn test_concurrent_seeding_creates_one_entry() {
        let store = Arc::new(BaselineStore::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || store.get_or_seed("shared-entity"))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Baseline::default());
        }
        assert_eq!(store.len(), 1);
        assert_eq!(store.keys(), vec!["shared-entity".to_string()]);
    }
}
