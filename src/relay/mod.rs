//! # Service-control relay
//!
//! Two stream proxies between the browser and the gateway:
//!
//! - **Log relay** ([`logs`]): byte-for-byte passthrough of the gateway's log
//!   tail. Upstream failure before the first byte fails the request.
//! - **Restart relay** ([`restart`]): forwards the restart progress stream and
//!   guarantees that it ends with a terminal (`done: true`) event, synthesizing
//!   `{status: "error", done: true}` when the upstream cannot provide one.
//!
//! Each client request gets its own upstream connection. Neither relay retries,
//! times out, or replays: a reconnecting client only sees what happens after it
//! attaches.

pub mod event;
pub mod logs;
pub mod restart;

pub use event::{is_terminal_payload, RestartProgressEvent, RestartStatus};
pub use logs::open_log_relay;
pub use restart::{pump_restart, spawn_restart_relay, RelayOutcome, DOWNSTREAM_CAPACITY, ENDED_EARLY};

use axum::{
    body::Body,
    http::{header, HeaderValue},
    response::Response,
};

/// Wrap a body as a live, unbuffered event feed.
pub fn event_stream_response(body: Body) -> Response {
    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-transform"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    // Stops nginx from buffering the feed.
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    response
}
