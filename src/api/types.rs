//! API response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Service name reported by the informational endpoints
pub const SERVICE_NAME: &str = "SysPulse Monitor";

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub service: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub features: Vec<String>,
}

/// Version response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionResponse {
    pub service: String,
    pub version: String,
}

/// Connected WebSocket subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientsResponse {
    pub connected_clients: usize,
    pub timestamp: DateTime<Utc>,
}

/// Acknowledgement of a state-changing request, e.g. `{"status": "updated"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
        }
    }
}
