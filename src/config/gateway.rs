//! Upstream gateway configuration
//!
//! The gateway is reachable two ways: over its public address (development
//! machines, which must present the shared secret) or over the private
//! network (production, no secret). The choice is made once, when the
//! configuration is resolved into a [`GatewayEndpoint`].

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Header carrying the shared secret in development mode
pub const AUTH_HEADER: &str = "X-Auth-Key";

/// Deployment mode of the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentMode {
    /// Gateway reached over its public address with the shared secret
    Development,
    /// Gateway reached over the private network without a secret
    #[default]
    Production,
}

impl FromStr for DeploymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(DeploymentMode::Development),
            "production" | "prod" => Ok(DeploymentMode::Production),
            _ => Err(format!("Invalid deployment mode: {}", s)),
        }
    }
}

impl std::fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentMode::Development => write!(f, "development"),
            DeploymentMode::Production => write!(f, "production"),
        }
    }
}

/// Gateway addressing and timeouts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub mode: DeploymentMode,
    pub public_host: String,
    pub public_port: u16,
    pub internal_host: String,
    pub internal_port: u16,
    /// Shared secret, only sent in development mode
    #[serde(skip_serializing_if = "String::is_empty")]
    pub auth_key: String,
    pub connect_timeout_seconds: u64,
    /// Timeout for one-shot control calls. Relay streams are never timed out.
    pub request_timeout_seconds: u64,
    pub stats_timeout_seconds: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            mode: DeploymentMode::Production,
            public_host: "127.0.0.1".to_string(),
            public_port: 5013,
            internal_host: "127.0.0.1".to_string(),
            internal_port: 4000,
            auth_key: String::new(),
            connect_timeout_seconds: 5,
            request_timeout_seconds: 30,
            stats_timeout_seconds: 8,
        }
    }
}

impl GatewayConfig {
    /// Resolve the mode-dependent address and credentials.
    pub fn endpoint(&self) -> GatewayEndpoint {
        match self.mode {
            DeploymentMode::Development => GatewayEndpoint {
                base_url: format!("http://{}:{}/api", self.public_host, self.public_port),
                auth_key: Some(self.auth_key.clone()).filter(|k| !k.is_empty()),
            },
            DeploymentMode::Production => GatewayEndpoint {
                base_url: format!("http://{}:{}/api", self.internal_host, self.internal_port),
                auth_key: None,
            },
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn stats_timeout(&self) -> Duration {
        Duration::from_secs(self.stats_timeout_seconds)
    }
}

/// Resolved gateway address. Built once at startup and never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct GatewayEndpoint {
    pub base_url: String,
    pub auth_key: Option<String>,
}

impl GatewayEndpoint {
    /// Endpoint with an explicit base URL, used to point at test doubles.
    pub fn new(base_url: impl Into<String>, auth_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_key,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

// Keeps the secret out of debug logs.
impl std::fmt::Debug for GatewayEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayEndpoint")
            .field("base_url", &self.base_url)
            .field("auth_key", &self.auth_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
