// One-shot system resource snapshot: CPU, memory, one disk, top processes

use crate::utils::percent_of;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use sysinfo::{Disks, System};
use tracing::{debug, info, warn};

pub const DEFAULT_MOUNT_POINT: &str = "/";
pub const DEFAULT_TOP_PROCESSES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSettings {
    pub mount_point: PathBuf,
    pub top_processes: usize,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            mount_point: PathBuf::from(DEFAULT_MOUNT_POINT),
            top_processes: DEFAULT_TOP_PROCESSES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessRow {
    pub pid: u32,
    pub cpu_percent: f32,
    pub mem_percent: f32,
    pub command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryUsage {
    pub used_bytes: u64,
    pub total_bytes: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiskUsage {
    pub mount_point: PathBuf,
    pub used_bytes: u64,
    pub total_bytes: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemSnapshot {
    pub taken_at: DateTime<Utc>,
    pub host_name: Option<String>,
    pub cpu_percent: f32,
    pub memory: MemoryUsage,
    pub mount_point: PathBuf,
    /// `None` when nothing is mounted at `mount_point`
    pub disk: Option<DiskUsage>,
    pub top_cpu: Vec<ProcessRow>,
    pub top_memory: Vec<ProcessRow>,
}

/// Take a snapshot of the running system.
///
/// CPU figures are deltas, so the CPU and process tables are refreshed
/// twice with `sysinfo::MINIMUM_CPU_UPDATE_INTERVAL` in between. That makes
/// this call block for a fraction of a second.
pub fn collect_snapshot(settings: &SnapshotSettings) -> Result<SystemSnapshot> {
    info!("Collecting system snapshot");

    let mut sys = System::new();
    sys.refresh_memory();
    sys.refresh_cpu();
    sys.refresh_processes();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu();
    sys.refresh_processes();

    let cpu_percent = sys.global_cpu_info().cpu_usage();
    let total_memory = sys.total_memory();
    let used_memory = sys.used_memory();
    let memory = MemoryUsage {
        used_bytes: used_memory,
        total_bytes: total_memory,
        percent: percent_of(used_memory, total_memory),
    };

    let disks = Disks::new_with_refreshed_list();
    let mounts: Vec<(PathBuf, u64, u64)> = disks
        .list()
        .iter()
        .map(|d| (d.mount_point().to_path_buf(), d.total_space(), d.available_space()))
        .collect();
    let disk = disk_usage_for(&mounts, &settings.mount_point);
    if disk.is_none() {
        warn!("No filesystem mounted at {}", settings.mount_point.display());
    }

    let rows: Vec<ProcessRow> = sys
        .processes()
        .values()
        .map(|process| {
            let memory_bytes = process.memory();
            ProcessRow {
                pid: process.pid().as_u32(),
                cpu_percent: process.cpu_usage(),
                mem_percent: percent_of(memory_bytes, total_memory) as f32,
                command: process.name().to_string(),
            }
        })
        .collect();
    debug!("Ranking {} processes", rows.len());

    Ok(SystemSnapshot {
        taken_at: Utc::now(),
        host_name: System::host_name(),
        cpu_percent,
        memory,
        mount_point: settings.mount_point.clone(),
        disk,
        top_cpu: top_by_cpu(&rows, settings.top_processes),
        top_memory: top_by_memory(&rows, settings.top_processes),
    })
}

/// Usage of the filesystem mounted exactly at `mount_point`, from
/// `(mount point, total bytes, available bytes)` tuples.
pub fn disk_usage_for(mounts: &[(PathBuf, u64, u64)], mount_point: &Path) -> Option<DiskUsage> {
    mounts
        .iter()
        .find(|(mount, _, _)| mount == mount_point)
        .map(|(mount, total, available)| {
            let used = total.saturating_sub(*available);
            DiskUsage {
                mount_point: mount.clone(),
                used_bytes: used,
                total_bytes: *total,
                percent: percent_of(used, *total),
            }
        })
}

pub fn top_by_cpu(rows: &[ProcessRow], n: usize) -> Vec<ProcessRow> {
    top_by(rows, n, |row| row.cpu_percent)
}

pub fn top_by_memory(rows: &[ProcessRow], n: usize) -> Vec<ProcessRow> {
    top_by(rows, n, |row| row.mem_percent)
}

/// Highest `key` first; ties broken by pid so the order is stable.
fn top_by(rows: &[ProcessRow], n: usize, key: impl Fn(&ProcessRow) -> f32) -> Vec<ProcessRow> {
    let mut ranked = rows.to_vec();
    ranked.sort_by(|a, b| {
        key(b)
            .total_cmp(&key(a))
            .then_with(|| a.pid.cmp(&b.pid))
    });
    ranked.truncate(n);
    ranked
}
