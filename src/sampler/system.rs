use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use sysinfo::{
    Disk, Disks, Networks, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System, Users,
};
use tracing::{error, trace};

use super::Sampler;
use super::network::{self, NetworkMeter, Pinger, PublicIpLookup, UNREACHABLE_PING_MS};
use crate::config::SamplerConfig;
use crate::{
    CpuInfo, DiskInfo, MemoryInfo, NetworkDetails, NetworkStats, ProcessInfo, Snapshot,
    SystemInfo,
};

/// Filesystems that never hold user data
const VIRTUAL_FILESYSTEMS: &[&str] = &[
    "tmpfs", "devtmpfs", "devfs", "squashfs", "overlay", "proc", "sysfs", "devpts", "mqueue",
    "debugfs", "securityfs", "pstore", "cgroup", "cgroup2", "ramfs", "nsfs",
];

/// Mount points tried when no physical filesystem qualifies
const FALLBACK_MOUNTS: &[&str] = &["/", "/home", "/mnt", "/media", "C:\\", "D:\\"];

/// Samples the local host through `sysinfo`.
///
/// The blocking `sysinfo` reads run on the blocking thread pool; the network
/// probes run on the runtime.
pub struct SystemSampler {
    probe: Option<HostProbe>,
    meter: NetworkMeter,
    pinger: Pinger,
    public_ip: PublicIpLookup,
    max_processes: Option<usize>,
}

impl SystemSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self {
            probe: Some(HostProbe::new()),
            meter: NetworkMeter::new(),
            pinger: Pinger::new(
                config.ping_targets,
                Duration::from_millis(config.ping_timeout_ms),
            ),
            public_ip: PublicIpLookup::new(
                config.public_ip_url,
                Duration::from_secs(config.public_ip_refresh_secs),
            ),
            max_processes: config.max_processes,
        }
    }

    async fn read_host(&mut self) -> HostReadings {
        let mut probe = self.probe.take().unwrap_or_else(HostProbe::new);

        match tokio::task::spawn_blocking(move || {
            let readings = probe.read();
            (probe, readings)
        })
        .await
        {
            Ok((probe, readings)) => {
                self.probe = Some(probe);
                readings
            }
            Err(e) => {
                // the probe is lost with the task; a fresh one is built next time
                error!("host probe failed: {e}");
                HostReadings::default()
            }
        }
    }
}

#[async_trait]
impl Sampler for SystemSampler {
    async fn sample(&mut self) -> Snapshot {
        let mut host = self.read_host().await;

        let (current_upload, current_download) =
            self.meter
                .update(host.bytes_sent, host.bytes_received, Instant::now());

        let ping = self.pinger.ping().await;
        let local_ip = match self.pinger.current_target() {
            Some(target) => network::local_ip(target).await.unwrap_or_default(),
            None => String::new(),
        };
        let public_ip = self.public_ip.current().await;

        if let Some(max) = self.max_processes {
            host.processes
                .sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));
            host.processes.truncate(max);
        }

        trace!(
            "sampled host: cpu {:.1}%, ram {:.1}%, disk {:.1}%",
            host.cpu.usage, host.memory.usage, host.disk.usage
        );

        Snapshot {
            timestamp: Utc::now(),
            cpu: host.cpu,
            memory: host.memory,
            disk: host.disk,
            system: host.system,
            network: NetworkStats {
                current_upload,
                current_download,
                ping: ping.unwrap_or(UNREACHABLE_PING_MS),
                is_online: ping.is_some(),
                local_ip,
            },
            network_details: NetworkDetails {
                public_ip,
                mac_address: host.mac_address,
                total_upload: self.meter.total_upload(),
                total_download: self.meter.total_download(),
            },
            processes: host.processes,
            alerts: Vec::new(),
        }
    }
}

/// Everything read from `sysinfo` in one blocking pass
#[derive(Debug, Default)]
struct HostReadings {
    cpu: CpuInfo,
    memory: MemoryInfo,
    disk: DiskInfo,
    system: SystemInfo,
    processes: Vec<ProcessInfo>,
    bytes_sent: u64,
    bytes_received: u64,
    mac_address: String,
}

struct HostProbe {
    system: System,
    users: Users,
}

impl HostProbe {
    fn new() -> Self {
        let mut system = System::new();
        // CPU usage is a delta between two refreshes
        system.refresh_cpu_usage();

        Self {
            system,
            users: Users::new_with_refreshed_list(),
        }
    }

    fn read(&mut self) -> HostReadings {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::everything(),
        );

        let networks = Networks::new_with_refreshed_list();
        let (bytes_sent, bytes_received) = networks
            .iter()
            .filter(|(name, _)| !is_loopback(name))
            .fold((0, 0), |(sent, received), (_, data)| {
                (
                    sent + data.total_transmitted(),
                    received + data.total_received(),
                )
            });
        let mac_address = networks
            .iter()
            .filter(|(name, _)| !is_loopback(name))
            .map(|(_, data)| data.mac_address())
            .find(|mac| !mac.is_unspecified())
            .map(|mac| mac.to_string())
            .unwrap_or_default();

        HostReadings {
            cpu: self.cpu(),
            memory: self.memory(),
            disk: disk_usage(&Disks::new_with_refreshed_list()),
            system: SystemInfo {
                hostname: System::host_name().unwrap_or_else(|| String::from("unknown")),
                os: String::from(std::env::consts::OS),
                platform: String::from(std::env::consts::ARCH),
                uptime: System::uptime(),
            },
            processes: self.processes(),
            bytes_sent,
            bytes_received,
            mac_address,
        }
    }

    fn cpu(&self) -> CpuInfo {
        let load = System::load_average();

        CpuInfo {
            usage: f64::from(self.system.global_cpu_usage()),
            cores: self.system.cpus().len(),
            load1: load.one,
            load5: load.five,
            load15: load.fifteen,
        }
    }

    fn memory(&self) -> MemoryInfo {
        let total = self.system.total_memory();
        let used = self.system.used_memory();

        MemoryInfo {
            total,
            used,
            available: self.system.available_memory(),
            usage: percent(used, total),
        }
    }

    fn processes(&self) -> Vec<ProcessInfo> {
        let total_memory = self.system.total_memory();

        self.system
            .processes()
            .values()
            .filter(|process| process.status() != ProcessStatus::Zombie)
            .map(|process| {
                let command_line = process
                    .cmd()
                    .iter()
                    .map(|arg| arg.to_string_lossy())
                    .collect::<Vec<_>>()
                    .join(" ");
                let user = process
                    .user_id()
                    .and_then(|uid| self.users.get_user_by_id(uid))
                    .map(|user| user.name().to_string())
                    .unwrap_or_default();

                ProcessInfo {
                    pid: process.pid().as_u32(),
                    process: process.name().to_string_lossy().into_owned(),
                    cpu_percent: f64::from(process.cpu_usage()),
                    memory_percent: percent(process.memory(), total_memory),
                    memory_rss: process.memory(),
                    status: process.status().to_string(),
                    command_line: if command_line.is_empty() {
                        String::from("System process")
                    } else {
                        command_line
                    },
                    user,
                    threads: process.tasks().map(|tasks| tasks.len()),
                    create_time: process.start_time(),
                }
            })
            .collect()
    }
}

fn is_loopback(interface: &str) -> bool {
    interface == "lo" || interface.starts_with("lo0") || interface.starts_with("Loopback")
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn is_physical(disk: &Disk) -> bool {
    let fs = disk.file_system().to_string_lossy();
    let mount = disk.mount_point().to_string_lossy();

    disk.total_space() > 0
        && !VIRTUAL_FILESYSTEMS.contains(&fs.as_ref())
        && !mount.starts_with("/snap")
        && !mount.starts_with("/boot")
}

/// Usage of the largest physical filesystem, then of a well-known mount point,
/// and zeros when neither is available.
fn disk_usage(disks: &Disks) -> DiskInfo {
    let chosen = disks
        .iter()
        .filter(|disk| is_physical(disk))
        .max_by_key(|disk| disk.total_space())
        .or_else(|| {
            FALLBACK_MOUNTS.iter().find_map(|mount| {
                disks
                    .iter()
                    .find(|disk| disk.mount_point() == Path::new(mount) && disk.total_space() > 0)
            })
        });

    match chosen {
        Some(disk) => {
            let total = disk.total_space();
            let free = disk.available_space();
            let used = total.saturating_sub(free);

            DiskInfo {
                total,
                used,
                free,
                usage: percent(used, total),
            }
        }
        None => DiskInfo::default(),
    }
}
