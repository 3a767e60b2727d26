use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use tracing::trace;

use crate::alerts::AlertConfig;
use crate::util;

/// Server configuration
///
/// Every field has a default, so an empty file (or no file at all) is a valid
/// configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub address: IpAddr,
    pub port: u16,
    /// "development" enables debug logging
    pub environment: String,
    /// Sampling interval in milliseconds
    pub update_interval_ms: u64,
    /// Initial alerting thresholds
    pub alerts: AlertConfig,
    pub hub: HubConfig,
    pub sampler: SamplerConfig,
    /// Directory served as the web dashboard
    pub static_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            environment: String::from("development"),
            update_interval_ms: 500,
            alerts: AlertConfig::default(),
            hub: HubConfig::default(),
            sampler: SamplerConfig::default(),
            static_dir: PathBuf::from("web/static"),
        }
    }
}

impl Config {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms.max(1))
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Apply `SYS_PULSE_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `SYS_PULSE_*` overrides looked up through `lookup`.
    ///
    /// Values that fail to parse are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        self.port = util::parse_or(&lookup, util::PORT, self.port);
        self.address = util::parse_or(&lookup, util::ADDR, self.address);
        self.environment = util::parse_or(&lookup, util::ENVIRONMENT, self.environment);
        self.update_interval_ms =
            util::parse_or(&lookup, util::UPDATE_INTERVAL, self.update_interval_ms);
        self.alerts.cpu_threshold =
            util::parse_or(&lookup, util::ALERT_CPU, self.alerts.cpu_threshold);
        self.alerts.ram_threshold =
            util::parse_or(&lookup, util::ALERT_RAM, self.alerts.ram_threshold);
        self.alerts.disk_threshold =
            util::parse_or(&lookup, util::ALERT_DISK, self.alerts.disk_threshold);
        self
    }
}

/// Broadcast hub configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Frames buffered per subscriber before it is disconnected as lagging
    pub queue_capacity: usize,
    /// Timeout for a single write to a subscriber connection
    pub write_timeout_secs: u64,
}

impl HubConfig {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 16,
            write_timeout_secs: 10,
        }
    }
}

/// Host sampler configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// `host:port` targets for the TCP round trip probe, tried in rotation
    pub ping_targets: Vec<String>,
    pub ping_timeout_ms: u64,
    /// Plain-text "what is my IP" endpoint; `None` disables the lookup
    pub public_ip_url: Option<String>,
    pub public_ip_refresh_secs: u64,
    /// Keep only the busiest processes; `None` keeps all of them
    pub max_processes: Option<usize>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            ping_targets: vec![
                String::from("8.8.8.8:80"),
                String::from("1.1.1.1:80"),
                String::from("77.88.8.8:80"),
            ],
            ping_timeout_ms: 1000,
            public_ip_url: Some(String::from("https://api.ipify.org")),
            public_ip_refresh_secs: 600,
            max_processes: None,
        }
    }
}

/// Read a configuration file: TOML for `.toml` files, JSON otherwise.
pub fn read_config_file(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let is_toml = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("toml"));

    let config = if is_toml {
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?
    };

    trace!("loaded config: {config:?}");
    Ok(config)
}
