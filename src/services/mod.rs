//! Managed service identifiers and the allow-list guarding them.
//!
//! A [`ServiceId`] is only ever built through [`ServiceId::parse`], so any
//! value that reaches an upstream URL is a plain path segment. The
//! [`ServiceCatalog`] then decides which identifiers may be tailed, restarted,
//! or have their public port toggled.

mod error;

pub use error::ServiceIdError;

use crate::config::ServicesConfig;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Longest accepted identifier
pub const MAX_SERVICE_ID_LEN: usize = 64;

/// Validated name of a managed service (e.g. `arvo-team`, `nydus`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ServiceId(String);

impl ServiceId {
    /// Accepts ASCII letters, digits, `-`, `_` and `.`, but never a bare `.`
    /// or `..` segment.
    pub fn parse(raw: &str) -> Result<Self, ServiceIdError> {
        if raw.is_empty() {
            return Err(ServiceIdError::Empty);
        }
        if raw.len() > MAX_SERVICE_ID_LEN {
            return Err(ServiceIdError::TooLong {
                max: MAX_SERVICE_ID_LEN,
            });
        }
        if let Some(bad) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(ServiceIdError::InvalidCharacter(bad));
        }
        if raw.chars().all(|c| c == '.') {
            return Err(ServiceIdError::InvalidCharacter('.'));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ServiceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Allow-list of services the console is permitted to act on.
#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    managed: BTreeSet<ServiceId>,
    toggleable: ServiceId,
}

impl ServiceCatalog {
    /// Build the catalog from validated configuration.
    pub fn from_config(config: &ServicesConfig) -> Result<Self, ServiceIdError> {
        let managed = config
            .managed
            .iter()
            .map(|name| ServiceId::parse(name))
            .collect::<Result<BTreeSet<_>, _>>()?;
        let toggleable = ServiceId::parse(&config.toggleable)?;
        if !managed.contains(&toggleable) {
            return Err(ServiceIdError::NotManaged(toggleable.0));
        }
        Ok(Self {
            managed,
            toggleable,
        })
    }

    /// Resolve a raw path segment to a managed service.
    pub fn resolve(&self, raw: &str) -> Result<ServiceId, ServiceIdError> {
        let id = ServiceId::parse(raw)?;
        if self.managed.contains(&id) {
            Ok(id)
        } else {
            Err(ServiceIdError::NotManaged(id.0))
        }
    }

    /// Resolve a raw path segment to the single toggleable service.
    pub fn resolve_toggleable(&self, raw: &str) -> Result<ServiceId, ServiceIdError> {
        if raw == self.toggleable.as_str() {
            Ok(self.toggleable.clone())
        } else {
            Err(ServiceIdError::NotToggleable(raw.to_string()))
        }
    }

    pub fn toggleable(&self) -> &ServiceId {
        &self.toggleable
    }

    /// Managed services in sorted order
    pub fn managed(&self) -> impl Iterator<Item = &ServiceId> {
        self.managed.iter()
    }

    pub fn len(&self) -> usize {
        self.managed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managed.is_empty()
    }
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self::from_config(&ServicesConfig::default())
            .expect("default service list is valid")
    }
}
