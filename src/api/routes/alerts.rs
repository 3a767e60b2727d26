//! Alert history and threshold configuration endpoints

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use tracing::instrument;

use crate::alerts::{AlertConfig, AlertHistory};
use crate::api::{error::ApiResult, state::ApiState, types::StatusResponse};

/// GET /api/alerts/history
pub async fn history(State(state): State<ApiState>) -> Json<AlertHistory> {
    Json(state.alerts.history().await)
}

/// GET /api/alerts/config
pub async fn get_config(State(state): State<ApiState>) -> Json<AlertConfig> {
    Json(state.alerts.config().await)
}

/// POST /api/alerts/config
///
/// Replaces the whole configuration. A body that does not decode leaves the
/// current configuration in place.
#[instrument(skip_all)]
pub async fn update_config(
    State(state): State<ApiState>,
    payload: Result<Json<AlertConfig>, JsonRejection>,
) -> ApiResult<Json<StatusResponse>> {
    let Json(config) = payload?;

    state.alerts.update_config(config).await;

    Ok(Json(StatusResponse::new("updated")))
}

/// POST /api/alerts/clear
///
/// Empties the history and forgets which alerts are active.
pub async fn clear(State(state): State<ApiState>) -> Json<StatusResponse> {
    state.alerts.clear_history().await;

    Json(StatusResponse::new("cleared"))
}
