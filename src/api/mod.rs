//! # Console HTTP API
//!
//! Client-facing endpoints of the service-control relay.
//!
//! ## Endpoints
//!
//! - `GET /maintenance/logs/{service}` - Live log tail (event stream)
//! - `GET /maintenance/restart/{service}` - Trigger a restart and stream its progress
//! - `POST /maintenance/toggle_port/{service}` - Start or stop the public API port
//! - `GET /maintenance/toggle_port/{service}` - Public API port state
//! - `GET /maintenance/stats` - Gateway statistics, `null` when unavailable
//! - `GET /health` - Liveness of this process
//!
//! ## Example
//!
//! ```no_run
//! use nydus::api::{create_router, AppState};
//! use nydus::config::ConsoleConfig;
//! use nydus::gateway::HttpGateway;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(ConsoleConfig::default());
//! let gateway = Arc::new(HttpGateway::new(&config.gateway)?);
//! let state = Arc::new(AppState::new(config, gateway)?);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, create_router(state)).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Non-streaming failures use one envelope:
//! ```json
//! { "error": { "message": "Upstream error", "type": "server_error", "code": "bad_gateway" } }
//! ```
//! Once a restart stream has started, failures are reported in-band as a
//! terminal `{status: "error", done: true}` event instead.

mod error;
mod health;
mod logs;
mod restart;
mod stats;
mod toggle;

pub use error::{ApiError, ApiErrorBody};
pub use toggle::ToggleRequest;

use crate::config::ConsoleConfig;
use crate::gateway::ServiceGateway;
use crate::services::{ServiceCatalog, ServiceIdError};
use axum::{http::HeaderValue, response::Response, routing::get, Router};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Response header carrying the relay correlation id
pub const RELAY_ID_HEADER: &str = "x-relay-id";

/// Shared application state accessible to all handlers.
///
/// Everything here is read-only after startup.
pub struct AppState {
    pub config: Arc<ConsoleConfig>,
    pub gateway: Arc<dyn ServiceGateway>,
    pub catalog: ServiceCatalog,
    /// Server startup time for uptime tracking
    pub start_time: Instant,
    /// Wall-clock startup time reported by `/health`
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create application state from configuration and a gateway client.
    pub fn new(
        config: Arc<ConsoleConfig>,
        gateway: Arc<dyn ServiceGateway>,
    ) -> Result<Self, ServiceIdError> {
        let catalog = ServiceCatalog::from_config(&config.services)?;
        Ok(Self {
            config,
            gateway,
            catalog,
            start_time: Instant::now(),
            started_at: Utc::now(),
        })
    }
}

/// Create the main API router with all endpoints configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.server.max_body_bytes;

    Router::new()
        .route("/maintenance/logs/:service", get(logs::handle))
        .route("/maintenance/restart/:service", get(restart::handle))
        .route(
            "/maintenance/toggle_port/:service",
            get(toggle::handle_status).post(toggle::handle_toggle),
        )
        .route("/maintenance/stats", get(stats::handle))
        .route("/health", get(health::handle))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn with_relay_id(mut response: Response, relay_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(relay_id) {
        response.headers_mut().insert(RELAY_ID_HEADER, value);
    }
    response
}
