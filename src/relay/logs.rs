//! Log tail relay.

use super::event_stream_response;
use crate::gateway::{ByteStream, GatewayError, ServiceGateway};
use crate::services::ServiceId;
use axum::{body::Body, response::Response};
use futures::StreamExt;
use std::time::Instant;
use tracing::{info, warn};

/// Open the upstream log tail for `service` and relay it verbatim.
///
/// Fails without producing a response when the gateway is unreachable or
/// answers with a non-success status. Once streaming, the upstream connection
/// lives exactly as long as the response body: a client disconnect drops the
/// body, which drops the upstream stream.
pub async fn open_log_relay(
    gateway: &dyn ServiceGateway,
    service: &ServiceId,
    relay_id: &str,
) -> Result<Response, GatewayError> {
    let upstream = gateway.open_log_stream(service).await?;
    info!(relay_id, service = %service, "Log relay opened");

    let body = passthrough(upstream, service.clone(), relay_id.to_string());
    Ok(event_stream_response(Body::from_stream(body)))
}

fn passthrough(
    mut upstream: ByteStream,
    service: ServiceId,
    relay_id: String,
) -> impl futures::Stream<Item = Result<axum::body::Bytes, GatewayError>> {
    async_stream::stream! {
        let _closed = CloseLog { relay_id: relay_id.clone(), service, started: Instant::now() };

        while let Some(chunk) = upstream.next().await {
            if let Err(e) = &chunk {
                warn!(relay_id = %relay_id, error = %e, "Log stream read error");
            }
            yield chunk;
        }
    }
}

/// Logs when the relay stream is dropped, whichever side ended it.
struct CloseLog {
    relay_id: String,
    service: ServiceId,
    started: Instant,
}

impl Drop for CloseLog {
    fn drop(&mut self) {
        info!(
            relay_id = %self.relay_id,
            service = %self.service,
            duration_ms = self.started.elapsed().as_millis() as u64,
            "Log relay closed"
        );
    }
}
