//! Restart endpoint handler.

use super::{with_relay_id, ApiError, AppState};
use crate::logging::generate_relay_id;
use crate::relay::spawn_restart_relay;
use axum::{
    extract::{Path, State},
    response::Response,
};
use std::sync::Arc;

/// GET /maintenance/restart/{service} - Restart the service and stream progress.
///
/// The response always starts as an event stream; upstream failures show up
/// as a terminal error event rather than an HTTP error status.
pub async fn handle(
    State(state): State<Arc<AppState>>,
    Path(service): Path<String>,
) -> Result<Response, ApiError> {
    let service = state.catalog.resolve(&service)?;
    let relay_id = generate_relay_id();

    let response = spawn_restart_relay(state.gateway.clone(), service, relay_id.clone());
    Ok(with_relay_id(response, &relay_id))
}
