//! Metric storage
//!
//! This module provides:
//! - The `MetricStore` port consumed by the analysis core
//! - An in-memory ring buffer with retention and capacity eviction

mod buffer;


pub use buffer::{InMemoryMetricStore, StoreConfig};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::Sample;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage read failed: {0}")]
    ReadFailed(String),
    #[error("storage write failed: {0}")]
    WriteFailed(String),
    #[error("storage lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// True when retrying cannot succeed
    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, StoreError::Poisoned)
    }
}

/// Keyed time-series storage for component samples
pub trait MetricStore: Send + Sync {
    /// Persist one sample.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write operation fails.
    fn record(&self, sample: Sample) -> Result<(), StoreError>;

    /// Newest sample recorded for `component`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read operation fails.
    fn latest_sample(&self, component: &str) -> Result<Option<Sample>, StoreError>;

    /// Samples with `start <= timestamp <= end`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read operation fails.
    fn samples_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Sample>, StoreError>;

    /// Newest sample of every known component, sorted by component key.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read operation fails.
    fn latest_per_component(&self) -> Result<Vec<Sample>, StoreError>;

    /// Most recent `count` samples, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read operation fails.
    fn recent(&self, count: usize) -> Result<Vec<Sample>, StoreError>;
}
