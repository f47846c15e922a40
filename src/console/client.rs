//! HTTP client for the relay's client-facing endpoints.

use super::ConsoleError;
use crate::gateway::ToggleAction;
use crate::sse::{SseDecoder, SseEvent};
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::{header, Client, Response};
use serde_json::{json, Value};
use std::time::Duration;

/// Events of one subscription, in arrival order, until the server closes it.
pub type EventStream = BoxStream<'static, Result<SseEvent, ConsoleError>>;

/// Status and JSON body of a port control call
#[derive(Debug, Clone, PartialEq)]
pub struct PortReply {
    pub status: u16,
    pub body: Value,
}

impl PortReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Talks to a running relay, e.g. `http://localhost:3000`.
#[derive(Debug, Clone)]
pub struct ConsoleClient {
    client: Client,
    base_url: String,
}

impl ConsoleClient {
    pub fn new(base_url: &str) -> Result<Self, ConsoleError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| ConsoleError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Open the live log tail of `service`.
    pub async fn subscribe_logs(&self, service: &str) -> Result<EventStream, ConsoleError> {
        self.subscribe(&format!("/maintenance/logs/{}", service))
            .await
    }

    /// Trigger a restart of `service` and follow its progress events.
    pub async fn subscribe_restart(&self, service: &str) -> Result<EventStream, ConsoleError> {
        self.subscribe(&format!("/maintenance/restart/{}", service))
            .await
    }

    pub async fn port_status(&self, service: &str) -> Result<PortReply, ConsoleError> {
        let url = self.url(&format!("/maintenance/toggle_port/{}", service));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| connect_error(&url, e))?;
        read_reply(response).await
    }

    pub async fn toggle_port(
        &self,
        service: &str,
        action: ToggleAction,
    ) -> Result<PortReply, ConsoleError> {
        let url = self.url(&format!("/maintenance/toggle_port/{}", service));
        let response = self
            .client
            .post(&url)
            .json(&json!({ "action": action }))
            .send()
            .await
            .map_err(|e| connect_error(&url, e))?;
        read_reply(response).await
    }

    async fn subscribe(&self, path: &str) -> Result<EventStream, ConsoleError> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| connect_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            return Err(ConsoleError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ConsoleError::Read(e.to_string())));
        Ok(decode_events(bytes).boxed())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turn a byte stream into events. Stops after the first read error.
pub fn decode_events<S, B>(bytes: S) -> impl futures::Stream<Item = Result<SseEvent, ConsoleError>>
where
    S: futures::Stream<Item = Result<B, ConsoleError>> + Send + 'static,
    B: AsRef<[u8]> + Send,
{
    async_stream::stream! {
        let mut bytes = Box::pin(bytes);
        let mut decoder = SseDecoder::new();
        while let Some(chunk) = bytes.next().await {
            match chunk {
                Ok(chunk) => {
                    for decoded in decoder.feed(chunk.as_ref()) {
                        yield Ok(decoded.event);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }
    }
}

fn connect_error(url: &str, err: reqwest::Error) -> ConsoleError {
    ConsoleError::Connect {
        url: url.to_string(),
        message: err.to_string(),
    }
}

async fn read_reply(response: Response) -> Result<PortReply, ConsoleError> {
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| ConsoleError::Read(e.to_string()))?;
    let body = serde_json::from_str(&text)
        .map_err(|e| ConsoleError::InvalidResponse(format!("{} (HTTP {})", e, status)))?;
    Ok(PortReply { status, body })
}

/// `error.message` from the relay's JSON envelope, or the raw body.
async fn error_message(response: Response) -> String {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(text)
}
