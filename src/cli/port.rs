//! Port command: public API port toggle client

use crate::cli::output::format_port_reply;
use crate::cli::{PortAction, PortArgs};
use crate::console::ConsoleClient;
use crate::gateway::ToggleAction;

/// Handle `nydus port` command
///
/// The relay's reply is printed as-is with `--json`. A non-success reply is
/// an error so scripts can rely on the exit code.
pub async fn handle_port(args: &PortArgs) -> Result<String, Box<dyn std::error::Error>> {
    let client = ConsoleClient::new(&args.url)?;

    let reply = match args.action {
        PortAction::Status => client.port_status(&args.service).await?,
        PortAction::Start => client.toggle_port(&args.service, ToggleAction::Start).await?,
        PortAction::Stop => client.toggle_port(&args.service, ToggleAction::Stop).await?,
    };

    let output = if args.json {
        serde_json::to_string_pretty(&reply.body)?
    } else {
        format_port_reply(&args.service, &reply)
    };

    if reply.is_success() {
        Ok(output)
    } else {
        Err(output.into())
    }
}
