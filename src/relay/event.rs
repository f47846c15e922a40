//! Restart progress events as exchanged with the gateway and the console.

use crate::sse::SseEvent;
use serde::{Deserialize, Serialize};

/// Phase reported by a restart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestartStatus {
    Progress,
    Success,
    Error,
}

impl std::fmt::Display for RestartStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestartStatus::Progress => write!(f, "progress"),
            RestartStatus::Success => write!(f, "success"),
            RestartStatus::Error => write!(f, "error"),
        }
    }
}

/// `{status, message, done}` payload of one restart stream event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartProgressEvent {
    pub status: RestartStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub done: bool,
}

impl RestartProgressEvent {
    pub fn progress(message: impl Into<String>) -> Self {
        Self {
            status: RestartStatus::Progress,
            message: message.into(),
            done: false,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: RestartStatus::Success,
            message: message.into(),
            done: true,
        }
    }

    /// Terminal failure, the only event the relay ever originates.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: RestartStatus::Error,
            message: message.into(),
            done: true,
        }
    }

    /// Parse an event payload; `None` for anything that is not a progress event.
    pub fn from_payload(data: &str) -> Option<Self> {
        serde_json::from_str(data).ok()
    }

    /// Encode as a single `data:` frame.
    pub fn to_frame(&self) -> String {
        // Serializing a struct of strings and enums cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        SseEvent::message(json).encode()
    }
}

/// Whether an upstream payload carries `"done": true`.
///
/// Checked on the raw JSON so that a terminal event with an unexpected status
/// still ends the relay.
pub fn is_terminal_payload(data: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(data)
        .ok()
        .and_then(|v| v.get("done").and_then(serde_json::Value::as_bool))
        .unwrap_or(false)
}
