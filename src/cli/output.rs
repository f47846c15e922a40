//! Output formatting helpers for CLI commands

use crate::console::{ConsoleUpdate, PortReply};
use crate::relay::{RestartProgressEvent, RestartStatus};
use crate::services::ServiceCatalog;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

/// View model for service display
#[derive(Debug, Clone, serde::Serialize)]
pub struct ServiceView {
    pub name: String,
    pub logs: String,
    pub restart: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toggle_port: Option<String>,
}

impl ServiceView {
    pub fn from_catalog(catalog: &ServiceCatalog) -> Vec<Self> {
        catalog
            .managed()
            .map(|id| Self {
                name: id.to_string(),
                logs: format!("/maintenance/logs/{}", id),
                restart: format!("/maintenance/restart/{}", id),
                toggle_port: (id == catalog.toggleable())
                    .then(|| format!("/maintenance/toggle_port/{}", id)),
            })
            .collect()
    }
}

/// Format services as a table
pub fn format_services_table(services: &[ServiceView]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Service", "Logs", "Restart", "Port Toggle"]);

    for s in services {
        table.add_row(vec![
            Cell::new(&s.name),
            Cell::new(&s.logs),
            Cell::new(&s.restart),
            Cell::new(s.toggle_port.as_deref().unwrap_or("-")),
        ]);
    }

    table.to_string()
}

/// Format services as JSON
pub fn format_services_json(services: &[ServiceView]) -> String {
    serde_json::to_string_pretty(&json!({ "services": services })).unwrap_or_default()
}

/// One restart event, coloured by status
pub fn format_restart_event(event: &RestartProgressEvent) -> String {
    let label = match event.status {
        RestartStatus::Progress => "progress".yellow(),
        RestartStatus::Success => "success".green(),
        RestartStatus::Error => "error".red(),
    };
    format!("[restart {}] {}", label, event.message)
}

/// Terminal rendering of a console update; `None` for silent ones
pub fn format_update(update: &ConsoleUpdate) -> Option<String> {
    match update {
        ConsoleUpdate::LogsOpened { service } => {
            Some(format!("{} {}", "Following logs of".dimmed(), service.bold()))
        }
        ConsoleUpdate::Line(line) => Some(line.clone()),
        ConsoleUpdate::LogsClosed { reason } => {
            Some(format!("{} {}", "Log stream closed:".red(), reason))
        }
        ConsoleUpdate::RestartStarted => Some("Restart requested".cyan().to_string()),
        ConsoleUpdate::Restart(event) => Some(format_restart_event(event)),
        ConsoleUpdate::RestartFailed { message } => Some(message.red().to_string()),
    }
}

/// Human-readable port state from a toggle or status reply
pub fn format_port_reply(service: &str, reply: &PortReply) -> String {
    if !reply.is_success() {
        let message = reply.body["error"]["message"]
            .as_str()
            .or_else(|| reply.body["error"].as_str())
            .map(str::to_string)
            .unwrap_or_else(|| reply.body.to_string());
        return format!("{} {} (HTTP {})", "✗".red(), message, reply.status);
    }

    match reply.body["running"].as_bool() {
        Some(true) => format!("{} public port of {} is {}", "✓".green(), service, "open".green()),
        Some(false) => format!("{} public port of {} is {}", "✓".green(), service, "closed".yellow()),
        None => format!("{} {}", "✓".green(), reply.body),
    }
}
