//! Backend factories keyed by type name.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::info;

use crate::backends::{FileBackend, NoopBackend, StaticBackend};
use crate::{AuthorizationBackend, AuthzConfig, AuthzError, BackendDescriptor, ChainEntry, ResolutionChain};

/// Builds a backend from its settings and the configuration directory.
///
/// Factories must not fail; initialization problems are captured by the
/// backend and reported on each call.
pub type BackendFactory = fn(&Map<String, Value>, &Path) -> Arc<dyn AuthorizationBackend>;

/// Registry of backend factories.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    factories: BTreeMap<String, BackendFactory>,
}

impl BackendRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in `noop`, `static` and `file` backends.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(NoopBackend::TYPE, |settings, path| {
            Arc::new(NoopBackend::new(settings, path))
        });
        registry.register(StaticBackend::TYPE, |settings, path| {
            Arc::new(StaticBackend::new(settings, path))
        });
        registry.register(FileBackend::TYPE, |settings, path| {
            Arc::new(FileBackend::new(settings, path))
        });
        registry
    }

    /// Registers a factory, replacing any previous one for `backend_type`.
    pub fn register(&mut self, backend_type: impl Into<String>, factory: BackendFactory) {
        self.factories.insert(backend_type.into(), factory);
    }

    /// Registered type names, sorted.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiates the backend described by `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::UnknownBackendType`] if no factory is registered
    /// for the descriptor's type.
    pub fn create(
        &self,
        descriptor: &BackendDescriptor,
        config_path: &Path,
    ) -> Result<Arc<dyn AuthorizationBackend>, AuthzError> {
        let factory = self
            .factories
            .get(&descriptor.backend_type)
            .ok_or_else(|| AuthzError::UnknownBackendType(descriptor.backend_type.clone()))?;
        Ok(factory(&descriptor.config, config_path))
    }

    /// Builds the resolution chain for `config`.
    ///
    /// Disabled backends are skipped; the rest are ordered by `order`.
    pub fn build_chain(
        &self,
        config: &AuthzConfig,
        config_path: &Path,
    ) -> Result<ResolutionChain, AuthzError> {
        config.validate()?;

        let entries = config
            .ordered_backends()
            .into_iter()
            .map(|descriptor| {
                let backend = self.create(descriptor, config_path)?;
                Ok(ChainEntry::new(descriptor.domain(), backend))
            })
            .collect::<Result<Vec<_>, AuthzError>>()?;

        info!(
            backends = ?entries.iter().map(ChainEntry::name).collect::<Vec<_>>(),
            "Authorization chain assembled"
        );

        let chain = ResolutionChain::new(entries);
        Ok(match config.backend_timeout() {
            Some(timeout) => chain.with_backend_timeout(timeout),
            None => chain,
        })
    }
}
