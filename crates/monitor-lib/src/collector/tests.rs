//! Tests for the sysinfo host collector
//!
//! These run against the real host, so they assert shape and bounds rather
//! than concrete values.

use super::*;
use crate::models::{is_disk_key, CORE_COMPONENTS, CPU, MEMORY, NETWORK, PROCESSES};

#[test]
fn test_collect_returns_core_components() {
    let collector = SysinfoCollector::new();
    let samples = collector.collect().unwrap();

    let keys: Vec<&str> = samples.iter().map(|s| s.component.as_str()).collect();
    assert_eq!(keys, CORE_COMPONENTS.to_vec());
}

#[test]
fn test_collect_values_in_range() {
    let collector = SysinfoCollector::new();
    let samples = collector.collect().unwrap();

    for sample in &samples {
        match sample.component.as_str() {
            CPU => {
                let cpu = sample.cpu_percent.unwrap();
                assert!((0.0..=100.0).contains(&cpu), "cpu out of range: {cpu}");
            }
            MEMORY => {
                let mem = sample.mem_percent.unwrap();
                assert!((0.0..=100.0).contains(&mem), "memory out of range: {mem}");
            }
            NETWORK => assert!(sample.network_rate_mbps.unwrap() >= 0.0),
            PROCESSES => assert!(sample.process_count.unwrap() > 0),
            other => panic!("unexpected component {other}"),
        }
    }
}

#[test]
fn test_collect_repeatedly() {
    let collector = SysinfoCollector::default();
    for _ in 0..3 {
        assert_eq!(collector.collect().unwrap().len(), 4);
    }
}

#[test]
fn test_list_disks_filtered_and_sorted() {
    let collector = SysinfoCollector::new();
    let disks = collector.list_disks().unwrap();

    for disk in &disks {
        assert!(is_disk_key(&disk.component_key()));
        assert!(!disk.file_system.to_lowercase().contains("tmpfs"));
        assert!(disk.used_gb >= 0.0);
        assert!(disk.used_gb <= disk.total_gb);
        assert!((0.0..=100.0).contains(&disk.usage_percent));
    }

    let mounts: Vec<&str> = disks.iter().map(|d| d.mount_point.as_str()).collect();
    let mut sorted = mounts.clone();
    sorted.sort();
    assert_eq!(mounts, sorted);
}

#[test]
fn test_collector_as_trait_object() {
    let collector: std::sync::Arc<dyn MetricsCollector> =
        std::sync::Arc::new(SysinfoCollector::new());
    assert!(collector.collect().is_ok());
    assert!(collector.list_disks().is_ok());
}
