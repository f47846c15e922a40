//! Log tail endpoint handler.

use super::{with_relay_id, ApiError, AppState};
use crate::logging::generate_relay_id;
use crate::relay::open_log_relay;
use axum::{
    extract::{Path, State},
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

/// GET /maintenance/logs/{service} - Relay the service's live log tail.
///
/// An upstream that cannot be opened fails the whole request with a generic
/// error; nothing is streamed in that case.
pub async fn handle(
    State(state): State<Arc<AppState>>,
    Path(service): Path<String>,
) -> Result<Response, ApiError> {
    let service = state.catalog.resolve(&service)?;
    let relay_id = generate_relay_id();

    let response = open_log_relay(state.gateway.as_ref(), &service, &relay_id)
        .await
        .map_err(|e| {
            warn!(relay_id = %relay_id, service = %service, error = %e, "Failed to open log stream");
            ApiError::upstream_error()
        })?;

    Ok(with_relay_id(response, &relay_id))
}
