//! Public API port toggle.

use super::{ApiError, AppState};
use crate::gateway::{GatewayReply, ToggleAction};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Body of `POST /maintenance/toggle_port/{service}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToggleRequest {
    pub action: ToggleAction,
}

/// POST /maintenance/toggle_port/{service} - Start or stop the public port.
///
/// The service is checked before the body so that a non-toggleable service
/// is rejected regardless of what was sent. The gateway's status and JSON
/// body are mirrored back unchanged.
pub async fn handle_toggle(
    State(state): State<Arc<AppState>>,
    Path(service): Path<String>,
    body: Result<Json<ToggleRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let service = state.catalog.resolve_toggleable(&service)?;
    let Json(request) = body.map_err(|rejection| {
        ApiError::bad_request(&format!(
            "action must be \"start\" or \"stop\": {}",
            rejection.body_text()
        ))
    })?;

    info!(service = %service, action = %request.action, "Toggling public API port");
    let reply = state
        .gateway
        .toggle_public(request.action)
        .await
        .map_err(|e| {
            warn!(service = %service, error = %e, "Port toggle failed");
            ApiError::from(e)
        })?;

    Ok(mirror(reply))
}

/// GET /maintenance/toggle_port/{service} - Current public port state.
pub async fn handle_status(
    State(state): State<Arc<AppState>>,
    Path(service): Path<String>,
) -> Result<Response, ApiError> {
    let service = state.catalog.resolve_toggleable(&service)?;
    let reply = state.gateway.public_status().await.map_err(|e| {
        warn!(service = %service, error = %e, "Port status check failed");
        ApiError::from(e)
    })?;

    Ok(mirror(reply))
}

fn mirror(reply: GatewayReply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(reply.body)).into_response()
}
