//! Structured logging helpers
//!
//! Filter construction for `tracing-subscriber` and the relay correlation id
//! that ties the log lines of one streamed request together.

pub mod middleware;

pub use middleware::generate_relay_id;

/// Build filter directives string from LoggingConfig
///
/// Produces `"<level>,nydus::<component>=<level>,..."`, components in
/// sorted order.
///
/// # Examples
///
/// ```
/// use nydus::config::logging::{LogFormat, LoggingConfig};
/// use nydus::logging::build_filter_directives;
/// use std::collections::BTreeMap;
///
/// let mut component_levels = BTreeMap::new();
/// component_levels.insert("relay".to_string(), "debug".to_string());
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Pretty,
///     component_levels: Some(component_levels),
/// };
///
/// assert_eq!(build_filter_directives(&config), "info,nydus::relay=debug");
/// ```
pub fn build_filter_directives(config: &crate::config::LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    if let Some(component_levels) = &config.component_levels {
        for (component, level) in component_levels {
            filter_str.push_str(&format!(",nydus::{}={}", component, level));
        }
    }

    filter_str
}
