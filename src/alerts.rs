//! Threshold alerting over sampled snapshots
//!
//! ## State Machine
//!
//! Each monitored resource (CPU, RAM, disk) is evaluated once per sampling cycle:
//!
//! ```text
//! value >= threshold       → raise alert (critical if value >= threshold + 10), mark active
//! value <  threshold       → clear active flag if set, raise nothing
//! alerting disabled        → no-op, state untouched
//! ```
//!
//! Raised alerts are appended to a bounded history of [`MAX_HISTORY`] entries.
//! Once the bound is exceeded the oldest entries are evicted first.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, instrument, trace, warn};

use crate::Snapshot;

/// Maximum number of alerts kept in the history
pub const MAX_HISTORY: usize = 50;

/// Distance above the threshold at which a warning becomes critical
pub const CRITICAL_MARGIN: f64 = 10.0;

/// Monitored resource an alert refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    #[serde(rename = "CPU")]
    Cpu,
    #[serde(rename = "RAM")]
    Ram,
    #[serde(rename = "DISK")]
    Disk,
}

impl AlertKind {
    pub const ALL: [AlertKind; 3] = [AlertKind::Cpu, AlertKind::Ram, AlertKind::Disk];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Cpu => "CPU",
            AlertKind::Ram => "RAM",
            AlertKind::Disk => "DISK",
        }
    }

    fn metric_label(&self) -> &'static str {
        match self {
            AlertKind::Cpu => "Loading",
            AlertKind::Ram | AlertKind::Disk => "Usage",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Critical,
}

impl AlertLevel {
    /// Classify a value that already reached its threshold.
    pub fn classify(value: f64, threshold: f64) -> AlertLevel {
        if value >= threshold + CRITICAL_MARGIN {
            AlertLevel::Critical
        } else {
            AlertLevel::Warning
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Warning => "warning",
            AlertLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raised alert. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub level: AlertLevel,
    pub value: f64,
    pub threshold: f64,
    pub timestamp: DateTime<Utc>,
    pub active: bool,
}

/// Alerting thresholds in percent.
///
/// Values are taken as given: thresholds outside `[0, 100]` are accepted and
/// simply make the corresponding alert always or never fire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    #[serde(alias = "cpu_treshold")]
    pub cpu_threshold: f64,
    #[serde(alias = "ram_treshold")]
    pub ram_threshold: f64,
    #[serde(alias = "disk_treshold")]
    pub disk_threshold: f64,
    pub enabled: bool,
}

impl AlertConfig {
    pub fn threshold(&self, kind: AlertKind) -> f64 {
        match kind {
            AlertKind::Cpu => self.cpu_threshold,
            AlertKind::Ram => self.ram_threshold,
            AlertKind::Disk => self.disk_threshold,
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cpu_threshold: 80.0,
            ram_threshold: 85.0,
            disk_threshold: 90.0,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertStats {
    pub total_alerts: usize,
    pub active_alerts: usize,
    pub today_alerts: usize,
}

/// Copy of the alert history, oldest first, with derived counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertHistory {
    pub alerts: Vec<Alert>,
    pub stats: AlertStats,
}

/// Alerting state: config, bounded history and the set of active resources.
///
/// This is the synchronous core; [`AlertEvaluator`] shares it between the
/// sampling driver and the request handlers.
#[derive(Debug, Clone)]
pub struct AlertBook {
    config: AlertConfig,
    history: VecDeque<Alert>,
    active: BTreeSet<AlertKind>,
    sequence: u64,
}

impl AlertBook {
    pub fn new(config: AlertConfig) -> Self {
        Self {
            config,
            history: VecDeque::with_capacity(MAX_HISTORY + AlertKind::ALL.len()),
            active: BTreeSet::new(),
            sequence: 0,
        }
    }

    /// Evaluate a snapshot and return the alerts raised by it.
    pub fn evaluate(&mut self, snapshot: &Snapshot, now: DateTime<Utc>) -> Vec<Alert> {
        if !self.config.enabled {
            return Vec::new();
        }

        let mut raised = Vec::new();

        for kind in AlertKind::ALL {
            let value = snapshot.usage(kind);
            let threshold = self.config.threshold(kind);

            if value >= threshold {
                let alert = self.raise(kind, value, threshold, now);
                trace!("{kind}: {value:.1}% >= {threshold:.1}% → {}", alert.level);
                raised.push(alert);
            } else if self.active.remove(&kind) {
                info!("{kind} alert cleared ({value:.1}% < {threshold:.1}%)");
            }
        }

        for alert in &raised {
            warn!("new alert: {}", alert.message);
            self.history.push_back(alert.clone());
        }

        while self.history.len() > MAX_HISTORY {
            self.history.pop_front();
        }

        raised
    }

    fn raise(&mut self, kind: AlertKind, value: f64, threshold: f64, now: DateTime<Utc>) -> Alert {
        let level = AlertLevel::classify(value, threshold);
        self.sequence += 1;
        self.active.insert(kind);

        Alert {
            id: format!("{kind}-{}-{}", now.timestamp(), self.sequence),
            kind,
            message: format_message(kind, value, threshold, level),
            level,
            value,
            threshold,
            timestamp: now,
            active: true,
        }
    }

    pub fn config(&self) -> AlertConfig {
        self.config
    }

    pub fn set_config(&mut self, config: AlertConfig) {
        self.config = config;
    }

    pub fn is_active(&self, kind: AlertKind) -> bool {
        self.active.contains(&kind)
    }

    pub fn active_kinds(&self) -> Vec<AlertKind> {
        self.active.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// History as seen at `now`; "today" starts at local midnight of `now`.
    pub fn history_at<Tz: TimeZone>(&self, now: DateTime<Tz>) -> AlertHistory {
        let timezone = now.timezone();
        let midnight = now.date_naive().and_time(NaiveTime::MIN);

        // a DST gap can swallow midnight, the day then starts at the first valid local time
        let midnight = (0..24 * 4)
            .map(|quarter| midnight + TimeDelta::minutes(15 * quarter))
            .find_map(|naive| timezone.from_local_datetime(&naive).earliest())
            .map(|midnight| midnight.with_timezone(&Utc));

        let today_alerts = match midnight {
            Some(midnight) => self
                .history
                .iter()
                .filter(|alert| alert.timestamp > midnight)
                .count(),
            None => 0,
        };

        AlertHistory {
            alerts: self.history.iter().cloned().collect(),
            stats: AlertStats {
                total_alerts: self.history.len(),
                active_alerts: self.active.len(),
                today_alerts,
            },
        }
    }

    /// Drop the history and forget every active resource.
    pub fn clear(&mut self) {
        self.history.clear();
        self.active.clear();
    }
}

fn format_message(kind: AlertKind, value: f64, threshold: f64, level: AlertLevel) -> String {
    format!(
        "[{kind}] {level}: {} {value:.1}% (Threshold: {threshold:.1}%)",
        kind.metric_label()
    )
}

/// Shared handle to the alerting state.
///
/// Every operation takes the lock for its whole duration, so evaluations,
/// config changes and history reads never observe each other half-done.
#[derive(Debug, Clone)]
pub struct AlertEvaluator {
    book: Arc<RwLock<AlertBook>>,
}

impl AlertEvaluator {
    pub fn new(config: AlertConfig) -> Self {
        Self {
            book: Arc::new(RwLock::new(AlertBook::new(config))),
        }
    }

    /// Evaluate a snapshot, returning the alerts raised by it.
    #[instrument(skip_all)]
    pub async fn evaluate(&self, snapshot: &Snapshot) -> Vec<Alert> {
        self.book.write().await.evaluate(snapshot, Utc::now())
    }

    pub async fn config(&self) -> AlertConfig {
        self.book.read().await.config()
    }

    pub async fn update_config(&self, config: AlertConfig) {
        self.book.write().await.set_config(config);
        info!(
            "alert config updated: CPU = {:.1}%, RAM = {:.1}%, Disk = {:.1}%, enabled = {}",
            config.cpu_threshold, config.ram_threshold, config.disk_threshold, config.enabled
        );
    }

    pub async fn history(&self) -> AlertHistory {
        self.book.read().await.history_at(Local::now())
    }

    pub async fn clear_history(&self) {
        self.book.write().await.clear();
        info!("alert history cleared");
    }

    pub async fn is_active(&self, kind: AlertKind) -> bool {
        self.book.read().await.is_active(kind)
    }
}
