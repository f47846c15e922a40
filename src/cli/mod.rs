//! CLI module for the Nydus console
//!
//! # Commands
//!
//! - `serve` - Run the service-control relay
//! - `console` - Tail a service's logs in the terminal, optionally restarting it
//! - `port` - Query or toggle the public API port
//! - `services` - List managed services and their relay endpoints
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Run the relay against a local gateway
//! ENVIRONMENT=development ARVO_NYDUS_API_KEY=s3cret nydus serve
//!
//! # Restart nydus and watch the progress
//! nydus console nydus --restart
//!
//! # Stop the public API port
//! nydus port stop
//! ```

pub mod completions;
pub mod config;
pub mod console;
pub mod output;
pub mod port;
pub mod serve;
pub mod services;

pub use completions::handle_completions;
pub use config::handle_config_init;

use crate::config::DeploymentMode;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Relay address used by client commands
pub const DEFAULT_RELAY_URL: &str = "http://localhost:3000";

/// Nydus - service maintenance console
#[derive(Parser, Debug)]
#[command(
    name = "nydus",
    version,
    about = "Live logs, restarts and port control for managed services"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the relay server
    Serve(ServeArgs),
    /// Follow a service's logs and optionally restart it
    Console(ConsoleArgs),
    /// Query or toggle the public API port
    Port(PortArgs),
    /// List managed services
    Services(ServicesArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "nydus.toml")]
    pub config: PathBuf,

    /// Override server port
    #[arg(short, long, env = "NYDUS_PORT")]
    pub port: Option<u16>,

    /// Override server host
    #[arg(short = 'H', long, env = "NYDUS_HOST")]
    pub host: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "NYDUS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Override deployment mode (development, production)
    #[arg(short, long)]
    pub mode: Option<DeploymentMode>,
}

#[derive(Args, Debug)]
pub struct ConsoleArgs {
    /// Service to follow
    pub service: String,

    /// Relay base URL
    #[arg(long, env = "NYDUS_URL", default_value = DEFAULT_RELAY_URL)]
    pub url: String,

    /// Restart the service and exit once the restart finishes
    #[arg(long)]
    pub restart: bool,

    /// Exit after this many log lines
    #[arg(short = 'n', long)]
    pub lines: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PortAction {
    /// Show whether the public port is open
    Status,
    /// Open the public port
    Start,
    /// Close the public port
    Stop,
}

#[derive(Args, Debug)]
pub struct PortArgs {
    #[arg(value_enum)]
    pub action: PortAction,

    /// Relay base URL
    #[arg(long, env = "NYDUS_URL", default_value = DEFAULT_RELAY_URL)]
    pub url: String,

    /// Service owning the port
    #[arg(short, long, default_value = "nydus")]
    pub service: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ServicesArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "nydus.toml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "nydus.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["nydus", "serve"]).unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.config, PathBuf::from("nydus.toml"));
                assert!(args.mode.is_none());
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_parse_serve_with_mode() {
        let cli = Cli::try_parse_from(["nydus", "serve", "--mode", "development", "-p", "9000"])
            .unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.mode, Some(DeploymentMode::Development));
                assert_eq!(args.port, Some(9000));
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_parse_console() {
        let cli =
            Cli::try_parse_from(["nydus", "console", "nydus", "--restart", "-n", "50"]).unwrap();
        match cli.command {
            Commands::Console(args) => {
                assert_eq!(args.service, "nydus");
                assert!(args.restart);
                assert_eq!(args.lines, Some(50));
            }
            _ => panic!("Expected Console command"),
        }
    }

    #[test]
    fn test_cli_parse_port() {
        let cli = Cli::try_parse_from(["nydus", "port", "start", "--json"]).unwrap();
        match cli.command {
            Commands::Port(args) => {
                assert_eq!(args.action, PortAction::Start);
                assert_eq!(args.service, "nydus");
                assert!(args.json);
            }
            _ => panic!("Expected Port command"),
        }
    }

    #[test]
    fn test_cli_parse_port_rejects_unknown_action() {
        assert!(Cli::try_parse_from(["nydus", "port", "restart"]).is_err());
    }

    #[test]
    fn test_cli_parse_services() {
        let cli = Cli::try_parse_from(["nydus", "services", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Services(ServicesArgs { json: true, .. })));
    }
}
