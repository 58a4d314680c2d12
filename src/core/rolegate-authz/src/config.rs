//! Chain and cache configuration.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cache::MAX_CACHE_TTL;
use crate::AuthzError;

/// Top-level authorization configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthzConfig {
    /// Role cache settings.
    pub cache: CacheConfig,

    /// Deadline for each backend call in milliseconds (`None` = no deadline).
    pub backend_timeout_ms: Option<u64>,

    /// Configured backends.
    pub backends: Vec<BackendDescriptor>,
}

/// Role cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Whether resolved users are cached.
    pub enabled: bool,
    /// Entry lifetime in seconds.
    pub ttl_secs: u64,
    /// Maximum number of cached users.
    pub max_entries: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3600,
            max_entries: Some(10_000),
        }
    }
}

/// One configured backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendDescriptor {
    /// Domain name used in logs; defaults to the backend type.
    #[serde(default)]
    pub name: Option<String>,

    /// Registered backend type (e.g. `static`, `file`).
    #[serde(rename = "type")]
    pub backend_type: String,

    /// Position in the chain; lower runs first.
    #[serde(default)]
    pub order: i32,

    /// Disabled backends are skipped when the chain is built.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Backend-specific settings, passed verbatim to the backend.
    #[serde(default)]
    pub config: Map<String, Value>,
}

fn default_enabled() -> bool {
    true
}

impl BackendDescriptor {
    /// Creates an enabled descriptor with empty settings.
    pub fn new(backend_type: impl Into<String>, order: i32) -> Self {
        Self {
            name: None,
            backend_type: backend_type.into(),
            order,
            enabled: true,
            config: Map::new(),
        }
    }

    /// Sets the domain name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the backend settings.
    pub fn with_config(mut self, config: Map<String, Value>) -> Self {
        self.config = config;
        self
    }

    /// Domain name, falling back to the backend type.
    pub fn domain(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.backend_type)
    }
}

impl AuthzConfig {
    /// Reads and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails [`AuthzConfig::validate`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AuthzError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| AuthzError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parses and validates a JSON configuration string.
    pub fn from_json(raw: &str) -> Result<Self, AuthzError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every backend has a type and a unique domain name.
    pub fn validate(&self) -> Result<(), AuthzError> {
        let mut seen = HashSet::new();
        for descriptor in &self.backends {
            if descriptor.backend_type.trim().is_empty() {
                return Err(AuthzError::Configuration(
                    "backend type cannot be empty".into(),
                ));
            }
            if !seen.insert(descriptor.domain()) {
                return Err(AuthzError::Configuration(format!(
                    "duplicate backend name: {}",
                    descriptor.domain()
                )));
            }
        }
        if self.cache.enabled && self.cache.ttl_secs == 0 {
            return Err(AuthzError::Configuration(
                "cache ttl_secs must be positive when the cache is enabled".into(),
            ));
        }
        if self.cache.ttl_secs > MAX_CACHE_TTL.as_secs() {
            return Err(AuthzError::Configuration(format!(
                "cache ttl_secs must not exceed {}",
                MAX_CACHE_TTL.as_secs()
            )));
        }
        Ok(())
    }

    /// Per-backend deadline.
    pub fn backend_timeout(&self) -> Option<Duration> {
        self.backend_timeout_ms.map(Duration::from_millis)
    }

    /// Enabled backends sorted by order; ties keep declaration order.
    pub fn ordered_backends(&self) -> Vec<&BackendDescriptor> {
        let mut enabled: Vec<_> = self.backends.iter().filter(|d| d.enabled).collect();
        enabled.sort_by_key(|d| d.order);
        enabled
    }
}
