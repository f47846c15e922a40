//! Gateway statistics passthrough.

use super::AppState;
use axum::{extract::State, Json};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// GET /maintenance/stats - Gateway statistics, or `null` when unavailable.
pub async fn handle(State(state): State<Arc<AppState>>) -> Json<Value> {
    match state.gateway.live_stats().await {
        Ok(stats) => Json(stats),
        Err(e) => {
            warn!(error = %e, "Failed to fetch live stats");
            Json(Value::Null)
        }
    }
}
