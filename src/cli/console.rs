//! Console command: the Live Console in a terminal

use crate::cli::output::format_update;
use crate::cli::ConsoleArgs;
use crate::console::{ConsoleClient, ConsoleUpdate, LiveConsole};
use crate::relay::RestartStatus;
use tokio::sync::broadcast::error::RecvError;

/// Handle `nydus console` command
///
/// Prints log lines and restart progress as they arrive. Returns once the
/// user interrupts, `--lines` lines were shown, the log stream closes with no
/// restart pending, or (with `--restart`) the restart reaches its end. A
/// failed restart is an error.
pub async fn run_console(args: ConsoleArgs) -> Result<(), Box<dyn std::error::Error>> {
    let client = ConsoleClient::new(&args.url)?;
    let mut console = LiveConsole::spawn(client, args.service.clone());
    let mut updates = console.subscribe();

    let mut restarting = args.restart;
    if args.restart && !console.restart().await {
        return Err("console stopped before the restart could be requested".into());
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut printed = 0usize;
    let result: Result<(), Box<dyn std::error::Error>> = loop {
        let update = tokio::select! {
            _ = &mut ctrl_c => break Ok(()),
            update = updates.recv() => update,
        };

        let update = match update {
            Ok(update) => update,
            Err(RecvError::Lagged(skipped)) => {
                eprintln!("... {} updates skipped", skipped);
                continue;
            }
            Err(RecvError::Closed) => break Ok(()),
        };

        if let Some(text) = format_update(&update) {
            println!("{}", text);
        }

        match update {
            ConsoleUpdate::Line(_) => {
                printed += 1;
                if args.lines.is_some_and(|max| printed >= max) {
                    break Ok(());
                }
            }
            ConsoleUpdate::LogsClosed { reason } if !restarting => break Err(reason.into()),
            ConsoleUpdate::Restart(event) if event.done => {
                restarting = false;
                if args.restart {
                    break match event.status {
                        RestartStatus::Error => Err(event.message.into()),
                        _ => Ok(()),
                    };
                }
            }
            ConsoleUpdate::RestartFailed { message } => {
                restarting = false;
                if args.restart {
                    break Err(message.into());
                }
            }
            _ => {}
        }
    };

    console.shutdown().await;
    result
}
