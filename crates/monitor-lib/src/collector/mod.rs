//! Host metrics collection
//!
//! This module provides the collector port consumed by the analysis core, a
//! sysinfo-backed implementation for the local host, and the periodic
//! collection loop that feeds the metric store.

mod host;
mod r#loop;

#[cfg(test)]
mod tests;

pub use host::{should_skip_disk, SysinfoCollector};
pub use r#loop::{CollectionConfig, CollectionLoop, CollectionLoopBuilder, CycleResults};

use thiserror::Error;

use crate::models::{DiskInfo, Sample};

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("failed to collect system metrics: {0}")]
    MetricsUnavailable(String),
    #[error("failed to enumerate disks: {0}")]
    DisksUnavailable(String),
}

/// Trait for host metrics sources
pub trait MetricsCollector: Send + Sync {
    /// Current samples for the core components (CPU, Memory, Network, Processes).
    ///
    /// # Errors
    ///
    /// Returns `CollectionError` if the host metrics cannot be read.
    fn collect(&self) -> Result<Vec<Sample>, CollectionError>;

    /// Currently mounted volumes, sorted by mount point.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError` if the disk list cannot be read.
    fn list_disks(&self) -> Result<Vec<DiskInfo>, CollectionError>;
}
