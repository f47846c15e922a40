//! Nydus - service maintenance console
//!
//! Relays live service logs and restart progress from a backend process
//! manager (the gateway) to browser and terminal clients, and forwards
//! start/stop requests for the public API port.

pub mod api;
pub mod cli;
pub mod config;
pub mod console;
pub mod gateway;
pub mod logging;
pub mod relay;
pub mod services;
pub mod sse;
