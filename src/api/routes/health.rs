//! Health check and version endpoints

use crate::api::types::{HealthResponse, SERVICE_NAME, VersionResponse};
use axum::Json;

/// GET /api/health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: SERVICE_NAME.to_string(),
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        features: ["WebSocket", "Real-Time", "Metrics"]
            .into_iter()
            .map(String::from)
            .collect(),
    })
}

/// GET /api/version
pub async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
