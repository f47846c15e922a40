//! Configuration module for the Nydus console
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`ENVIRONMENT`, `ARVO_*`, `NYDUS_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! The result is built once at startup and shared read-only; nothing in the
//! relay reads the process environment after that.
//!
//! # Example
//!
//! ```rust
//! use nydus::config::ConsoleConfig;
//!
//! let config = ConsoleConfig::default();
//! assert_eq!(config.server.port, 3000);
//!
//! let toml = r#"
//! [gateway]
//! mode = "development"
//! auth_key = "s3cret"
//! "#;
//! let config: ConsoleConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.gateway.endpoint().auth_key.as_deref(), Some("s3cret"));
//! ```

pub mod error;
pub mod gateway;
pub mod logging;
pub mod server;
pub mod services;

pub use error::ConfigError;
pub use gateway::{DeploymentMode, GatewayConfig, GatewayEndpoint, AUTH_HEADER};
pub use logging::{LogFormat, LoggingConfig};
pub use server::ServerConfig;
pub use services::ServicesConfig;

use crate::services::ServiceId;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the console server.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConsoleConfig {
    /// HTTP listener
    pub server: ServerConfig,
    /// Upstream gateway addressing
    pub gateway: GatewayConfig,
    /// Service allow-list
    pub services: ServicesConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ConsoleConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Gateway variables keep the names the deployment already exports.
    /// Invalid numeric values are ignored (the previous value is kept).
    pub fn with_env_overrides(mut self) -> Self {
        // Anything other than "development" means production.
        if let Ok(env) = std::env::var("ENVIRONMENT") {
            self.gateway.mode = if env == "development" {
                DeploymentMode::Development
            } else {
                DeploymentMode::Production
            };
        }
        if let Ok(host) = std::env::var("ARVO_VPS_IP") {
            self.gateway.public_host = host;
        }
        if let Ok(port) = std::env::var("ARVO_VPS_API_PORT") {
            if let Ok(p) = port.parse() {
                self.gateway.public_port = p;
            }
        }
        if let Ok(host) = std::env::var("ARVO_VPS_INTERNAL_IP") {
            self.gateway.internal_host = host;
        }
        if let Ok(port) = std::env::var("ARVO_VPS_INTERNAL_API_PORT") {
            if let Ok(p) = port.parse() {
                self.gateway.internal_port = p;
            }
        }
        if let Ok(key) = std::env::var("ARVO_NYDUS_API_KEY") {
            self.gateway.auth_key = key;
        }

        // Server settings
        if let Ok(port) = std::env::var("NYDUS_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(host) = std::env::var("NYDUS_HOST") {
            self.server.host = host;
        }

        // Logging settings
        if let Ok(level) = std::env::var("NYDUS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("NYDUS_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(validation("server.port", "port must be non-zero"));
        }
        if self.gateway.public_port == 0 {
            return Err(validation("gateway.public_port", "port must be non-zero"));
        }
        if self.gateway.internal_port == 0 {
            return Err(validation("gateway.internal_port", "port must be non-zero"));
        }
        if self.gateway.mode == DeploymentMode::Development && self.gateway.auth_key.is_empty() {
            return Err(validation(
                "gateway.auth_key",
                "a shared secret is required in development mode",
            ));
        }

        if self.services.managed.is_empty() {
            return Err(validation(
                "services.managed",
                "at least one managed service is required",
            ));
        }
        for (i, name) in self.services.managed.iter().enumerate() {
            if let Err(e) = ServiceId::parse(name) {
                return Err(validation(&format!("services.managed[{}]", i), &e.to_string()));
            }
        }
        if !self.services.managed.contains(&self.services.toggleable) {
            return Err(validation(
                "services.toggleable",
                "must be one of the managed services",
            ));
        }

        Ok(())
    }
}

fn validation(field: &str, message: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}
