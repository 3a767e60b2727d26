//! Latest snapshot and subscriber endpoints

use axum::{Json, extract::State};

use crate::Snapshot;
use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::ClientsResponse,
};

/// GET /api/metrics
///
/// Returns the most recently broadcast snapshot, including the alerts raised
/// in that cycle.
pub async fn latest_metrics(State(state): State<ApiState>) -> ApiResult<Json<Snapshot>> {
    let snapshot = state
        .hub
        .latest()
        .await
        .ok_or_else(|| ApiError::ServiceUnavailable("no metrics sampled yet".to_string()))?;

    Ok(Json(Snapshot::clone(&snapshot)))
}

/// GET /api/clients
pub async fn connected_clients(State(state): State<ApiState>) -> Json<ClientsResponse> {
    Json(ClientsResponse {
        connected_clients: state.hub.active_count().await,
        timestamp: chrono::Utc::now(),
    })
}
