//! Upstream service gateway interface.
//!
//! The gateway is the backend process manager: it tails service logs, runs
//! restarts, and toggles the public API port. Everything the console needs
//! from it goes through the [`ServiceGateway`] trait, so relays can be driven
//! by the real HTTP client or by an in-process double.

mod error;
mod http;

pub use error::GatewayError;
pub use http::HttpGateway;

use crate::services::ServiceId;
use async_trait::async_trait;
use axum::body::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Raw upstream body, chunk by chunk, as it arrives.
pub type ByteStream = BoxStream<'static, Result<Bytes, GatewayError>>;

/// Start/stop command for the public port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleAction {
    Start,
    Stop,
}

impl std::fmt::Display for ToggleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToggleAction::Start => write!(f, "start"),
            ToggleAction::Stop => write!(f, "stop"),
        }
    }
}

/// JSON answer of a one-shot control call, kept with its status code so it
/// can be mirrored to the caller unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayReply {
    pub status: u16,
    pub body: serde_json::Value,
}

/// Operations the console consumes from the backend process manager.
///
/// Stream methods resolve once the upstream has answered with a success
/// status; the returned stream then yields body chunks until the upstream
/// closes or fails. Dropping the stream releases the connection.
#[async_trait]
pub trait ServiceGateway: Send + Sync + 'static {
    /// `GET /maintenance/logs/{service}`
    async fn open_log_stream(&self, service: &ServiceId) -> Result<ByteStream, GatewayError>;

    /// `GET /maintenance/restart/{service}`. Opening the stream triggers the restart.
    async fn open_restart_stream(&self, service: &ServiceId)
        -> Result<ByteStream, GatewayError>;

    /// `POST /toggle-public` with `{action}`
    async fn toggle_public(&self, action: ToggleAction) -> Result<GatewayReply, GatewayError>;

    /// `GET /toggle-public`
    async fn public_status(&self) -> Result<GatewayReply, GatewayError>;

    /// `GET /stats`
    async fn live_stats(&self) -> Result<serde_json::Value, GatewayError>;
}
