//! Services command: list the allow-list and relay endpoints

use crate::cli::output::{format_services_json, format_services_table, ServiceView};
use crate::cli::ServicesArgs;
use crate::config::ConsoleConfig;
use crate::services::ServiceCatalog;

/// Handle `nydus services` command
pub fn handle_services(args: &ServicesArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = if args.config.exists() {
        ConsoleConfig::load(Some(&args.config))?
    } else {
        ConsoleConfig::default()
    };
    let catalog = ServiceCatalog::from_config(&config.services)?;
    let views = ServiceView::from_catalog(&catalog);

    if args.json {
        Ok(format_services_json(&views))
    } else {
        Ok(format_services_table(&views))
    }
}
