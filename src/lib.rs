pub mod actors;
pub mod alerts;
pub mod api;
pub mod config;
pub mod sampler;
pub mod util;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alerts::{Alert, AlertKind};

/// One sample of every monitored metric, as streamed to subscribers.
///
/// Built by a [`sampler::Sampler`], annotated with the alerts raised during the
/// same cycle and then handed to the hub as a read-only value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub cpu: CpuInfo,
    pub memory: MemoryInfo,
    pub disk: DiskInfo,
    pub system: SystemInfo,
    pub network: NetworkStats,
    pub network_details: NetworkDetails,
    pub processes: Vec<ProcessInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<Alert>,
}

impl Snapshot {
    /// Usage percentage of the resource watched by the given alert kind.
    pub fn usage(&self, kind: AlertKind) -> f64 {
        match kind {
            AlertKind::Cpu => self.cpu.usage,
            AlertKind::Ram => self.memory.usage,
            AlertKind::Disk => self.disk.usage,
        }
    }

    pub fn with_alerts(mut self, alerts: Vec<Alert>) -> Self {
        self.alerts = alerts;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CpuInfo {
    /// Usage in percent
    pub usage: f64,
    pub cores: usize,
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

/// Memory totals in bytes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryInfo {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub usage: f64,
}

/// Disk totals in bytes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiskInfo {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub usage: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemInfo {
    pub hostname: String,
    pub os: String,
    pub platform: String,
    /// Seconds since boot
    pub uptime: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkStats {
    /// Mbit/s since the previous sample
    pub current_upload: f64,
    /// Mbit/s since the previous sample
    pub current_download: f64,
    /// Round trip in milliseconds
    pub ping: f64,
    pub is_online: bool,
    pub local_ip: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkDetails {
    pub public_ip: String,
    pub mac_address: String,
    /// MiB sent since the sampler started
    pub total_upload: u64,
    /// MiB received since the sampler started
    pub total_download: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub process: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_rss: u64,
    pub status: String,
    pub command_line: String,
    pub user: String,
    pub threads: Option<usize>,
    /// Unix seconds
    pub create_time: u64,
}
