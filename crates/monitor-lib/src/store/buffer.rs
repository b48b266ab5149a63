//! In-memory sample ring buffer
//!
//! - 24-hour retention measured against sample timestamps
//! - FIFO eviction once the capacity is reached

use std::collections::{BTreeMap, VecDeque};
use std::sync::RwLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{MetricStore, StoreError};
use crate::models::Sample;

/// Default retention period (24 hours)
const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Default maximum buffer size (100,000 entries)
const DEFAULT_MAX_SIZE: usize = 100_000;

/// Configuration for the in-memory store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum age of a retained sample
    pub max_retention: Duration,
    /// Maximum number of retained samples
    pub max_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_retention: DEFAULT_RETENTION,
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

/// Ring buffer of samples in insertion order
pub struct InMemoryMetricStore {
    samples: RwLock<VecDeque<Sample>>,
    config: StoreConfig,
}

impl InMemoryMetricStore {
    /// Create a store with default retention and capacity
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            samples: RwLock::new(VecDeque::with_capacity(config.max_size.min(10_000))),
            config,
        }
    }

    /// Number of retained samples
    pub fn len(&self) -> usize {
        self.samples.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.config.max_size
    }

    fn evict(&self, buffer: &mut VecDeque<Sample>, now: DateTime<Utc>) {
        let retention = chrono::Duration::from_std(self.config.max_retention)
            .unwrap_or_else(|_| chrono::Duration::hours(24));
        let cutoff = now - retention;

        let before = buffer.len();
        buffer.retain(|s| s.timestamp >= cutoff);

        while buffer.len() >= self.config.max_size {
            buffer.pop_front();
        }

        let evicted = before - buffer.len();
        if evicted > 0 {
            debug!(evicted = evicted, retained = buffer.len(), "Evicted samples from store");
        }
    }
}

impl Default for InMemoryMetricStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricStore for InMemoryMetricStore {
    fn record(&self, sample: Sample) -> Result<(), StoreError> {
        let mut buffer = self
            .samples
            .write()
            .map_err(|_| StoreError::Poisoned)?;

        if self.config.max_size == 0 {
            return Ok(());
        }

        self.evict(&mut buffer, Utc::now());
        buffer.push_back(sample);
        Ok(())
    }

    fn latest_sample(&self, component: &str) -> Result<Option<Sample>, StoreError> {
        let buffer = self
            .samples
            .read()
            .map_err(|_| StoreError::Poisoned)?;

        // later insertions win timestamp ties
        Ok(buffer
            .iter()
            .filter(|s| s.component == component)
            .fold(None::<&Sample>, |best, s| match best {
                Some(b) if b.timestamp > s.timestamp => Some(b),
                _ => Some(s),
            })
            .cloned())
    }

    fn samples_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Sample>, StoreError> {
        let buffer = self
            .samples
            .read()
            .map_err(|_| StoreError::Poisoned)?;

        let mut samples: Vec<Sample> = buffer
            .iter()
            .filter(|s| s.timestamp >= start && s.timestamp <= end)
            .cloned()
            .collect();
        samples.sort_by_key(|s| s.timestamp);
        Ok(samples)
    }

    fn latest_per_component(&self) -> Result<Vec<Sample>, StoreError> {
        let buffer = self
            .samples
            .read()
            .map_err(|_| StoreError::Poisoned)?;

        let mut latest: BTreeMap<&str, &Sample> = BTreeMap::new();
        for sample in buffer.iter() {
            let newer = latest
                .get(sample.component.as_str())
                .map_or(true, |existing| existing.timestamp <= sample.timestamp);
            if newer {
                latest.insert(sample.component.as_str(), sample);
            }
        }

        Ok(latest.into_values().cloned().collect())
    }

    fn recent(&self, count: usize) -> Result<Vec<Sample>, StoreError> {
        let buffer = self
            .samples
            .read()
            .map_err(|_| StoreError::Poisoned)?;

        Ok(buffer.iter().rev().take(count).cloned().collect())
    }
}
