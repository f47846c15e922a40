//! Shared test utilities for the relay integration tests.
//!
//! Provides an in-process gateway double, router builders, and helpers for
//! pointing the real HTTP gateway client at a wiremock server.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::response::Response;
use futures::{stream, StreamExt};
use nydus::api::{create_router, AppState};
use nydus::config::{ConsoleConfig, DeploymentMode};
use nydus::console::{LiveConsole, ServicePanel};
use nydus::gateway::{
    ByteStream, GatewayError, GatewayReply, HttpGateway, ServiceGateway, ToggleAction,
};
use nydus::services::ServiceId;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::MockServer;

// =============================================================================
// Event Frames
// =============================================================================

/// `data: <payload>\n\n`
pub fn frame(payload: &str) -> String {
    format!("data: {}\n\n", payload)
}

pub fn progress_frame(message: &str) -> String {
    frame(&json!({"status": "progress", "message": message, "done": false}).to_string())
}

pub fn success_frame(message: &str) -> String {
    frame(&json!({"status": "success", "message": message, "done": true}).to_string())
}

/// `data: line 1\n\n` ... `data: line n\n\n`
pub fn log_lines(n: usize) -> String {
    (1..=n).map(|i| frame(&format!("line {}", i))).collect()
}

// =============================================================================
// Scripted Gateway
// =============================================================================

/// What an upstream stream does when opened.
#[derive(Clone)]
pub enum Script {
    /// Yield the chunks, then end.
    Chunks(Vec<Result<Bytes, GatewayError>>),
    /// Yield the chunks, then stay open.
    Open(Vec<Bytes>),
    /// Yield the chunks, then stay open; the flag is set once the stream is dropped.
    Tracked(Vec<Bytes>, Arc<AtomicBool>),
    /// Refuse to open.
    Fail(GatewayError),
}

/// Sets its flag when dropped.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl Script {
    pub fn text(chunks: &[&str]) -> Self {
        Script::Chunks(
            chunks
                .iter()
                .map(|c| Ok(Bytes::from(c.to_string())))
                .collect(),
        )
    }

    pub fn open(chunks: &[&str]) -> Self {
        Script::Open(chunks.iter().map(|c| Bytes::from(c.to_string())).collect())
    }

    /// Open stream whose drop is recorded in the returned flag.
    pub fn tracked(chunks: &[&str]) -> (Self, Arc<AtomicBool>) {
        let dropped = Arc::new(AtomicBool::new(false));
        let chunks = chunks.iter().map(|c| Bytes::from(c.to_string())).collect();
        (Script::Tracked(chunks, Arc::clone(&dropped)), dropped)
    }

    fn play(&self) -> Result<ByteStream, GatewayError> {
        match self {
            Script::Chunks(chunks) => Ok(stream::iter(chunks.clone()).boxed()),
            Script::Open(chunks) => Ok(stream::iter(chunks.clone().into_iter().map(Ok::<Bytes, GatewayError>))
                .chain(stream::pending())
                .boxed()),
            Script::Tracked(chunks, dropped) => {
                let guard = DropFlag(Arc::clone(dropped));
                Ok(stream::iter(chunks.clone().into_iter().map(Ok::<Bytes, GatewayError>))
                    .chain(stream::pending())
                    .map(move |chunk| {
                        let _held = &guard;
                        chunk
                    })
                    .boxed())
            }
            Script::Fail(e) => Err(e.clone()),
        }
    }
}

/// In-process gateway that plays back canned responses and counts calls.
pub struct ScriptedGateway {
    pub logs: Script,
    pub restart: Script,
    pub toggle_reply: GatewayReply,
    pub status_reply: GatewayReply,
    pub stats: Result<Value, GatewayError>,
    pub restart_calls: AtomicUsize,
    pub toggle_calls: AtomicUsize,
    pub toggled: Mutex<Vec<ToggleAction>>,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self {
            logs: Script::open(&[]),
            restart: Script::text(&[&success_frame("restarted")]),
            toggle_reply: GatewayReply {
                status: 200,
                body: json!({"running": true}),
            },
            status_reply: GatewayReply {
                status: 200,
                body: json!({"running": false}),
            },
            stats: Ok(json!({"cpu": 0.5})),
            restart_calls: AtomicUsize::new(0),
            toggle_calls: AtomicUsize::new(0),
            toggled: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedGateway {
    pub fn with_logs(logs: Script) -> Self {
        Self {
            logs,
            ..Default::default()
        }
    }

    pub fn with_restart(restart: Script) -> Self {
        Self {
            restart,
            ..Default::default()
        }
    }
}

#[async_trait]
impl ServiceGateway for ScriptedGateway {
    async fn open_log_stream(&self, _service: &ServiceId) -> Result<ByteStream, GatewayError> {
        self.logs.play()
    }

    async fn open_restart_stream(&self, _service: &ServiceId) -> Result<ByteStream, GatewayError> {
        self.restart_calls.fetch_add(1, Ordering::SeqCst);
        self.restart.play()
    }

    async fn toggle_public(&self, action: ToggleAction) -> Result<GatewayReply, GatewayError> {
        self.toggle_calls.fetch_add(1, Ordering::SeqCst);
        self.toggled.lock().unwrap().push(action);
        Ok(self.toggle_reply.clone())
    }

    async fn public_status(&self) -> Result<GatewayReply, GatewayError> {
        Ok(self.status_reply.clone())
    }

    async fn live_stats(&self) -> Result<Value, GatewayError> {
        self.stats.clone()
    }
}

// =============================================================================
// App Builders
// =============================================================================

/// Router over the given gateway with default configuration.
pub fn app_with(gateway: Arc<dyn ServiceGateway>) -> axum::Router {
    let config = Arc::new(ConsoleConfig::default());
    let state = Arc::new(AppState::new(config, gateway).unwrap());
    create_router(state)
}

/// Configuration whose gateway base URL points at `server`.
pub fn config_for(server: &MockServer, mode: DeploymentMode) -> ConsoleConfig {
    let addr = server.address();
    let mut config = ConsoleConfig::default();
    config.gateway.mode = mode;
    config.gateway.public_host = addr.ip().to_string();
    config.gateway.public_port = addr.port();
    config.gateway.internal_host = addr.ip().to_string();
    config.gateway.internal_port = addr.port();
    if mode == DeploymentMode::Development {
        config.gateway.auth_key = "test-secret".to_string();
    }
    config
}

/// Router backed by the real HTTP gateway client talking to `server`.
pub fn app_for_mock(server: &MockServer, mode: DeploymentMode) -> axum::Router {
    let config = Arc::new(config_for(server, mode));
    let gateway = Arc::new(HttpGateway::new(&config.gateway).unwrap());
    let state = Arc::new(AppState::new(config, gateway).unwrap());
    create_router(state)
}

/// Serve the relay on an ephemeral port and return its base URL.
pub async fn spawn_relay(gateway: Arc<dyn ServiceGateway>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = app_with(gateway);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

// =============================================================================
// Response Helpers
// =============================================================================

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

/// Payloads of the events in an event-stream body.
pub fn event_payloads(wire: &str) -> Vec<String> {
    nydus::sse::SseDecoder::new()
        .feed(wire.as_bytes())
        .into_iter()
        .map(|d| d.event.data)
        .collect()
}

/// Wait until the console's panel satisfies `check`, or panic after 5s.
pub async fn wait_for_panel(
    console: &LiveConsole,
    check: impl Fn(&ServicePanel) -> bool,
) -> ServicePanel {
    let mut rx = console.watch();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if check(&rx.borrow_and_update()) {
                return rx.borrow().clone();
            }
            if rx.changed().await.is_err() {
                return rx.borrow().clone();
            }
        }
    })
    .await
    .expect("panel did not reach the expected state")
}
