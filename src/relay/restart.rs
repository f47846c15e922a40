//! Restart progress relay.
//!
//! One task per client connection moves chunks from the upstream restart
//! stream to a bounded channel whose receiver is the response body. The task
//! owns the sending half, so the downstream is closed on every exit path when
//! the task returns.

use super::event::{is_terminal_payload, RestartProgressEvent};
use super::event_stream_response;
use crate::gateway::{GatewayError, ServiceGateway};
use crate::services::ServiceId;
use crate::sse::SseDecoder;
use axum::{
    body::{Body, Bytes},
    response::Response,
};
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn, Instrument};

/// Chunks buffered between the pump and the response body.
///
/// The pump reserves this slot before it pulls the next upstream chunk, so a
/// stalled client holds back the upstream after a single chunk.
pub const DOWNSTREAM_CAPACITY: usize = 1;

/// Message of the synthesized event when the upstream closes early
pub const ENDED_EARLY: &str = "restart stream ended before completion";

/// How a restart relay finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The upstream delivered its own terminal event
    Completed,
    /// The relay emitted a terminal error event with this message
    Synthesized(String),
    /// The client went away; the upstream was abandoned
    ClientGone,
}

/// Start the relay task and return the streaming response immediately.
pub fn spawn_restart_relay(
    gateway: Arc<dyn ServiceGateway>,
    service: ServiceId,
    relay_id: String,
) -> Response {
    let (tx, mut rx) = mpsc::channel::<Bytes>(DOWNSTREAM_CAPACITY);

    let span = tracing::info_span!("restart_relay", relay_id = %relay_id, service = %service);
    tokio::spawn(
        async move {
            info!("Restart relay opened");
            let upstream = tokio::select! {
                _ = tx.closed() => {
                    info!("Client left before the restart started");
                    return;
                }
                opened = gateway.open_restart_stream(&service) => opened,
            };
            match pump_restart(upstream, tx).await {
                RelayOutcome::Completed => info!("Restart relay completed"),
                RelayOutcome::Synthesized(reason) => {
                    warn!(reason = %reason, "Restart relay ended with synthesized error")
                }
                RelayOutcome::ClientGone => info!("Client disconnected from restart relay"),
            }
        }
        .instrument(span),
    );

    let body = async_stream::stream! {
        while let Some(chunk) = rx.recv().await {
            yield Ok::<_, Infallible>(chunk);
        }
    };
    event_stream_response(Body::from_stream(body))
}

/// Relay `upstream` into `downstream` until a terminal event, an upstream
/// failure, or a client disconnect.
///
/// Chunks are forwarded as they arrive, one in flight at a time. The chunk holding the terminal event
/// is cut right after that event's frame. If the upstream cannot be opened,
/// fails, or ends without a terminal event, exactly one
/// `{status: "error", done: true}` frame is written last. `downstream` is
/// dropped on return, which ends the response body.
pub async fn pump_restart<S>(
    upstream: Result<S, GatewayError>,
    downstream: mpsc::Sender<Bytes>,
) -> RelayOutcome
where
    S: Stream<Item = Result<Bytes, GatewayError>> + Unpin,
{
    let mut tracker = TerminalTracker::default();

    let mut upstream = match upstream {
        Ok(stream) => stream,
        Err(e) => return emit_failure(&downstream, &tracker, e.to_string()).await,
    };

    let reason = loop {
        // Nothing is pulled from upstream until the client has room for it.
        let permit = match downstream.reserve().await {
            Ok(permit) => permit,
            Err(_) => return RelayOutcome::ClientGone,
        };

        let next = tokio::select! {
            biased;
            _ = downstream.closed() => return RelayOutcome::ClientGone,
            next = upstream.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                let terminal_end = tracker.scan(&chunk);
                let forward = match terminal_end {
                    Some(end) => chunk.slice(..end),
                    None => chunk,
                };
                if !forward.is_empty() {
                    permit.send(forward);
                }
                if terminal_end.is_some() {
                    return RelayOutcome::Completed;
                }
            }
            Some(Err(e)) => break e.to_string(),
            None => break ENDED_EARLY.to_string(),
        }
    };

    emit_failure(&downstream, &tracker, reason).await
}

async fn emit_failure(
    downstream: &mpsc::Sender<Bytes>,
    tracker: &TerminalTracker,
    reason: String,
) -> RelayOutcome {
    let mut frame = String::new();
    if tracker.has_partial() {
        // Close the dangling upstream frame so ours is parsed on its own.
        frame.push_str("\n\n");
    }
    frame.push_str(&RestartProgressEvent::failure(reason.clone()).to_frame());

    if downstream.send(Bytes::from(frame)).await.is_err() {
        return RelayOutcome::ClientGone;
    }
    RelayOutcome::Synthesized(reason)
}

/// Watches forwarded bytes for the first `done: true` event.
#[derive(Default)]
struct TerminalTracker {
    decoder: SseDecoder,
}

impl TerminalTracker {
    /// Offset just past the terminal frame, if this chunk completes one.
    fn scan(&mut self, chunk: &[u8]) -> Option<usize> {
        self.decoder
            .feed(chunk)
            .into_iter()
            .find(|decoded| is_terminal_payload(&decoded.event.data))
            .map(|decoded| decoded.end)
    }

    fn has_partial(&self) -> bool {
        self.decoder.has_partial()
    }
}
