use std::str::FromStr;

pub const PORT: &str = "SYS_PULSE_PORT";

pub const ADDR: &str = "SYS_PULSE_ADDR";

pub const ENVIRONMENT: &str = "SYS_PULSE_ENVIRONMENT";

pub const UPDATE_INTERVAL: &str = "SYS_PULSE_UPDATE_INTERVAL";

pub const ALERT_CPU: &str = "SYS_PULSE_ALERT_CPU";

pub const ALERT_RAM: &str = "SYS_PULSE_ALERT_RAM";

pub const ALERT_DISK: &str = "SYS_PULSE_ALERT_DISK";

/// Parse the value stored under `key`, falling back to `default` when it is
/// missing, empty or unparsable.
pub fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

/// Human readable byte count, e.g. `1.5 GB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{bytes} B");
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    let prefix = ['K', 'M', 'G', 'T', 'P', 'E'][exp];
    format!("{:.1} {prefix}B", bytes as f64 / div as f64)
}
