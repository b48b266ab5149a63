//! sysinfo-backed collector for the local host

use std::sync::Mutex;
use std::time::Instant;

use chrono::Utc;
use sysinfo::{Disks, Networks, System};
use tracing::debug;

use super::{CollectionError, MetricsCollector};
use crate::models::{DiskInfo, Sample, CPU, MEMORY, NETWORK, PROCESSES};

const BYTES_PER_GB: f64 = 1_073_741_824.0;
const BYTES_PER_MB: f64 = 1_048_576.0;

/// Volumes smaller than this are treated as virtual and skipped
const MIN_DISK_BYTES: u64 = 100 * 1024 * 1024;

/// Filesystem type fragments that mark memory-backed filesystems
const SKIPPED_FILESYSTEMS: &[&str] = &["tmpfs", "ramfs", "devtmpfs"];

/// Mount trees of pseudo filesystems
const SKIPPED_MOUNTS: &[&str] = &["/proc", "/sys", "/dev", "/snap"];

/// Returns true if a volume should not be reported as a disk component
pub fn should_skip_disk(file_system: &str, mount_point: &str, total_bytes: u64) -> bool {
    let fs = file_system.to_lowercase();
    let mount = mount_point.to_lowercase();

    SKIPPED_FILESYSTEMS.iter().any(|t| fs.contains(t))
        || SKIPPED_MOUNTS.iter().any(|m| is_under(&mount, m))
        || total_bytes < MIN_DISK_BYTES
}

/// `mount` is `root` itself or a path below it
fn is_under(mount: &str, root: &str) -> bool {
    mount
        .strip_prefix(root)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

struct HostState {
    system: System,
    disks: Disks,
    networks: Networks,
    last_network_refresh: Instant,
}

/// Collects CPU, memory, network, process and disk metrics using `sysinfo`.
///
/// `sysinfo` needs `&mut` access to refresh, so the handles sit behind a
/// mutex.
pub struct SysinfoCollector {
    state: Mutex<HostState>,
}

impl SysinfoCollector {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu();
        system.refresh_memory();

        Self {
            state: Mutex::new(HostState {
                system,
                disks: Disks::new_with_refreshed_list(),
                networks: Networks::new_with_refreshed_list(),
                last_network_refresh: Instant::now(),
            }),
        }
    }
}

impl Default for SysinfoCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector for SysinfoCollector {
    fn collect(&self) -> Result<Vec<Sample>, CollectionError> {
        let mut state = self.state.lock().map_err(|e| {
            CollectionError::MetricsUnavailable(format!("host state lock poisoned: {e}"))
        })?;

        state.system.refresh_cpu();
        state.system.refresh_memory();
        state.system.refresh_processes();

        let cpu = f64::from(state.system.global_cpu_info().cpu_usage());
        let memory = memory_percent(state.system.total_memory(), state.system.available_memory());
        let processes = u32::try_from(state.system.processes().len()).unwrap_or(u32::MAX);

        state.networks.refresh();
        let elapsed = state.last_network_refresh.elapsed().as_secs_f64();
        state.last_network_refresh = Instant::now();
        let bytes: u64 = state
            .networks
            .iter()
            .map(|(_, data)| data.received() + data.transmitted())
            .sum();
        let network_rate = if elapsed > 0.0 {
            bytes as f64 / BYTES_PER_MB / elapsed
        } else {
            0.0
        };

        debug!(
            cpu_percent = cpu,
            mem_percent = memory,
            network_rate_mbps = network_rate,
            process_count = processes,
            "Collected host metrics"
        );

        let now = Utc::now();
        Ok(vec![
            Sample::new(CPU, now).with_cpu(round2(cpu)),
            Sample::new(MEMORY, now).with_memory(round2(memory)),
            Sample::new(NETWORK, now).with_network_rate(round2(network_rate)),
            Sample::new(PROCESSES, now).with_process_count(processes),
        ])
    }

    fn list_disks(&self) -> Result<Vec<DiskInfo>, CollectionError> {
        let mut state = self.state.lock().map_err(|e| {
            CollectionError::DisksUnavailable(format!("host state lock poisoned: {e}"))
        })?;
        state.disks.refresh_list();

        let mut disks: Vec<DiskInfo> = state
            .disks
            .iter()
            .filter(|d| {
                !should_skip_disk(
                    &d.file_system().to_string_lossy(),
                    &d.mount_point().to_string_lossy(),
                    d.total_space(),
                )
            })
            .map(|d| {
                let total = d.total_space();
                let free = d.available_space();
                let used = total.saturating_sub(free);
                let usage_percent = if total > 0 {
                    used as f64 / total as f64 * 100.0
                } else {
                    0.0
                };

                DiskInfo {
                    name: d.name().to_string_lossy().to_string(),
                    mount_point: d.mount_point().to_string_lossy().to_string(),
                    total_gb: total as f64 / BYTES_PER_GB,
                    used_gb: used as f64 / BYTES_PER_GB,
                    free_gb: free as f64 / BYTES_PER_GB,
                    usage_percent,
                    file_system: d.file_system().to_string_lossy().to_string(),
                }
            })
            .collect();

        disks.sort_by(|a, b| a.mount_point.cmp(&b.mount_point));
        Ok(disks)
    }
}

fn memory_percent(total: u64, available: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    total.saturating_sub(available) as f64 / total as f64 * 100.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_percent() {
        assert_eq!(memory_percent(1000, 250), 75.0);
        assert_eq!(memory_percent(0, 0), 0.0);
        // available larger than total clamps to zero usage
        assert_eq!(memory_percent(100, 200), 0.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.3456), 12.35);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_skip_rules() {
        let gb = 1024 * 1024 * 1024;
        assert!(should_skip_disk("tmpfs", "/run", 4 * gb));
        assert!(should_skip_disk("ext4", "/snap/core/123", 4 * gb));
        assert!(should_skip_disk("ext4", "/boot/efi", 50 * 1024 * 1024));
        assert!(should_skip_disk("NTFS", "D:\\", 0));
        assert!(!should_skip_disk("ext4", "/", 500 * gb));
        assert!(!should_skip_disk("NTFS", "C:\\", 200 * gb));
    }

    #[test]
    fn test_skip_rules_match_whole_path_components() {
        let gb = 1024 * 1024 * 1024;
        assert!(should_skip_disk("ext4", "/sys", 4 * gb));
        assert!(should_skip_disk("ext4", "/sys/fs/cgroup", 4 * gb));
        assert!(should_skip_disk("ext4", "/dev/shm", 4 * gb));
        assert!(!should_skip_disk("xfs", "/mnt/sysdata", 200 * gb));
        assert!(!should_skip_disk("ext4", "/devel", 200 * gb));
        assert!(!should_skip_disk("ext4", "/home/snapshots", 200 * gb));
        assert!(!should_skip_disk("ext4", "/data/proc", 200 * gb));
    }
}
