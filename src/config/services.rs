//! Managed service allow-list

use serde::{Deserialize, Serialize};

/// Which services the console may tail, restart, or toggle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Services whose logs and restart stream are relayed
    pub managed: Vec<String>,
    /// The single service whose public port can be toggled
    pub toggleable: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            managed: vec![
                "arvo-team".to_string(),
                "nydus".to_string(),
                "nydus-ui".to_string(),
                "nginx".to_string(),
            ],
            toggleable: "nydus".to_string(),
        }
    }
}
