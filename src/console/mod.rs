//! # Live Console
//!
//! Client side of the relay: a per-service panel that tails logs into a
//! bounded buffer and follows restarts until they reach a terminal state.
//!
//! - [`LogBuffer`]: the last [`MAX_LINES`] log lines
//! - [`ServicePanel`]: `Idle` / `StreamingLogs` / `Restarting` / `Error`
//! - [`ConsoleClient`]: HTTP calls and event-stream subscriptions
//! - [`LiveConsole`]: background task wiring the three together

mod buffer;
mod client;
mod error;
mod live;
mod panel;

pub use buffer::{LogBuffer, MAX_LINES};
pub use client::{decode_events, ConsoleClient, EventStream, PortReply};
pub use error::ConsoleError;
pub use live::{ConsoleUpdate, LiveConsole};
pub use panel::{PanelState, RestartSession, ServicePanel, RESTART_CONNECTION_CLOSED};
