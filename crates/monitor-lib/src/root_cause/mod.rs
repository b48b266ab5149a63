//! Dependency-graph root-cause analysis
//!
//! This module provides:
//! - The causal topology between core components and dynamically discovered disks
//! - A resolver that scores every upstream candidate against fixed baselines

mod resolver;
mod topology;

pub use resolver::{
    baseline_for, DiskCorrelation, RootCauseResolver, CPU_BASELINE, DEFAULT_BASELINE,
    DISK_ABNORMAL_USED_GB, DISK_BASELINE, FALLBACK_CONFIDENCE, MAX_CONFIDENCE, MEMORY_BASELINE,
    NETWORK_BASELINE, PROCESSES_BASELINE,
};
pub use topology::{DependencyEdge, DependencyTopology};
