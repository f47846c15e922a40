//! Per-service panel state machine.
//!
//! ```text
//!            logs_opened              begin_restart
//!   Idle ───────────────▶ StreamingLogs ─────────────▶ Restarting
//!    ▲                        │   ▲                       │
//!    │                logs_failed └── done (logs open) ───┤
//!    │                        ▼                           │
//!    └── done (no logs) ──  Error ◀── restart_failed ─────┘
//! ```
//!
//! The panel only records what happened; opening and closing subscriptions is
//! the driver's job (see [`super::LiveConsole`]).

use super::buffer::LogBuffer;
use crate::relay::RestartProgressEvent;
use serde::Serialize;

/// Shown when the restart subscription itself fails
pub const RESTART_CONNECTION_CLOSED: &str = "Connection closed during restart.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelState {
    Idle,
    StreamingLogs,
    Restarting,
    Error,
}

/// Progress of one restart invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestartSession {
    /// Latest event received, or the locally generated failure
    pub last_event: Option<RestartProgressEvent>,
    #[serde(rename = "isProcessing")]
    pub is_processing: bool,
}

#[derive(Debug, Clone)]
pub struct ServicePanel {
    service: String,
    state: PanelState,
    buffer: LogBuffer,
    logs_open: bool,
    restart: Option<RestartSession>,
    error: Option<String>,
}

impl ServicePanel {
    pub fn new(service: impl Into<String>) -> Self {
        Self::with_buffer(service, LogBuffer::new())
    }

    pub fn with_buffer(service: impl Into<String>, buffer: LogBuffer) -> Self {
        Self {
            service: service.into(),
            state: PanelState::Idle,
            buffer,
            logs_open: false,
            restart: None,
            error: None,
        }
    }

    /// A log subscription was (re)established. Starts from an empty buffer.
    pub fn logs_opened(&mut self) {
        self.buffer.clear();
        self.logs_open = true;
        self.error = None;
        if self.state != PanelState::Restarting {
            self.state = PanelState::StreamingLogs;
        }
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.buffer.push(line);
    }

    /// The log subscription failed and was closed. Lines received so far stay.
    pub fn logs_failed(&mut self, reason: impl Into<String>) {
        self.logs_open = false;
        self.error = Some(reason.into());
        if self.state != PanelState::Restarting {
            self.state = PanelState::Error;
        }
    }

    /// Start a restart session. Returns `false`, changing nothing, while one
    /// is already running.
    pub fn begin_restart(&mut self) -> bool {
        if self.state == PanelState::Restarting {
            return false;
        }
        self.state = PanelState::Restarting;
        self.error = None;
        self.restart = Some(RestartSession {
            last_event: None,
            is_processing: true,
        });
        true
    }

    /// Record a restart event. Returns `true` when it ended the session.
    pub fn restart_event(&mut self, event: RestartProgressEvent) -> bool {
        if self.state != PanelState::Restarting {
            return false;
        }
        let done = event.done;
        if let Some(session) = self.restart.as_mut() {
            session.last_event = Some(event);
            if done {
                session.is_processing = false;
            }
        }
        if done {
            self.state = self.resting_state();
        }
        done
    }

    /// The restart subscription broke before a terminal event arrived.
    pub fn restart_failed(&mut self) {
        if self.state != PanelState::Restarting {
            return;
        }
        self.restart = Some(RestartSession {
            last_event: Some(RestartProgressEvent::failure(RESTART_CONNECTION_CLOSED)),
            is_processing: false,
        });
        self.error = Some(RESTART_CONNECTION_CLOSED.to_string());
        self.state = PanelState::Error;
    }

    /// Point the panel at another service. The caller re-subscribes.
    pub fn switch_service(&mut self, service: impl Into<String>) {
        self.service = service.into();
        self.buffer.clear();
        self.logs_open = false;
        self.restart = None;
        self.error = None;
        self.state = PanelState::Idle;
    }

    /// Every subscription was closed.
    pub fn teardown(&mut self) {
        self.logs_open = false;
        if let Some(session) = self.restart.as_mut() {
            session.is_processing = false;
        }
        if self.state != PanelState::Error {
            self.state = PanelState::Idle;
        }
    }

    fn resting_state(&self) -> PanelState {
        if self.logs_open {
            PanelState::StreamingLogs
        } else if self.error.is_some() {
            PanelState::Error
        } else {
            PanelState::Idle
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn buffer(&self) -> &LogBuffer {
        &self.buffer
    }

    pub fn restart(&self) -> Option<&RestartSession> {
        self.restart.as_ref()
    }

    pub fn is_processing(&self) -> bool {
        self.restart.as_ref().is_some_and(|s| s.is_processing)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn logs_open(&self) -> bool {
        self.logs_open
    }
}
