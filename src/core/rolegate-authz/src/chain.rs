//! Ordered chain of authorization backends.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::{AuthCredentials, AuthorizationBackend, SecurityError, SecurityErrorKind, User};

/// A configured backend together with its domain name.
#[derive(Clone)]
pub struct ChainEntry {
    name: String,
    backend: Arc<dyn AuthorizationBackend>,
}

impl ChainEntry {
    /// Creates an entry. The domain name labels the entry in logs and reports.
    pub fn new(name: impl Into<String>, backend: Arc<dyn AuthorizationBackend>) -> Self {
        Self {
            name: name.into(),
            backend,
        }
    }

    /// Domain name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backend type.
    pub fn backend_type(&self) -> &str {
        self.backend.backend_type()
    }
}

/// Progress of one resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionState {
    /// Not started.
    #[default]
    Pending,
    /// Backends are being invoked.
    Resolving,
    /// Every backend has been attempted, or the user came from the cache.
    Resolved,
}

/// A backend failure recorded during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFailure {
    /// Domain name of the failing entry.
    pub domain: String,
    /// Error returned by the backend.
    pub error: SecurityError,
}

/// Outcome of one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    /// Pass state.
    pub state: ResolutionState,
    /// Domains whose backend returned successfully, in invocation order.
    pub succeeded: Vec<String>,
    /// Backend failures, in invocation order.
    pub failures: Vec<BackendFailure>,
    /// Whether the user was served from the role cache.
    pub cache_hit: bool,
}

impl ResolutionReport {
    /// Report for a user served from the cache.
    pub fn cached() -> Self {
        Self {
            state: ResolutionState::Resolved,
            cache_hit: true,
            ..Self::default()
        }
    }

    /// Returns `true` if at least one backend ran and every backend failed.
    pub fn all_failed(&self) -> bool {
        self.succeeded.is_empty() && !self.failures.is_empty()
    }

    /// Returns `true` if no backend failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Ordered set of backends invoked against one user per pass.
///
/// Backends run sequentially in chain order. A failing backend is logged
/// and recorded in the [`ResolutionReport`]; it never stops the pass, and
/// roles it may have added before failing are discarded.
#[derive(Clone, Default)]
pub struct ResolutionChain {
    entries: Vec<ChainEntry>,
    backend_timeout: Option<Duration>,
}

impl ResolutionChain {
    /// Creates a chain invoking `entries` in the given order.
    pub fn new(entries: Vec<ChainEntry>) -> Self {
        Self {
            entries,
            backend_timeout: None,
        }
    }

    /// Sets a deadline for each backend call. An expired call counts as an
    /// unreachable backend.
    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = Some(timeout);
        self
    }

    /// Entries in invocation order.
    pub fn entries(&self) -> &[ChainEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the chain has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs every backend against `user`.
    ///
    /// On return `user` holds its prior roles plus the union of roles from
    /// every backend that succeeded.
    pub async fn resolve(&self, user: &mut User) -> ResolutionReport {
        let mut report = ResolutionReport {
            state: ResolutionState::Resolving,
            ..ResolutionReport::default()
        };
        let credentials = AuthCredentials::empty();

        for entry in &self.entries {
            let backend_type = entry.backend_type();
            debug!(domain = %entry.name, backend = %backend_type, user = %user.name(), "Filling roles");

            let mut working = user.clone();
            match self.invoke(entry, &mut working, &credentials).await {
                Ok(()) => {
                    let before = user.roles().len();
                    user.absorb(working);
                    debug!(
                        domain = %entry.name,
                        backend = %backend_type,
                        added = user.roles().len() - before,
                        "Backend filled roles"
                    );
                    report.succeeded.push(entry.name.clone());
                },
                Err(error) => {
                    match error.kind() {
                        SecurityErrorKind::InsufficientCredentials => warn!(
                            domain = %entry.name,
                            backend = %error.backend_type(),
                            user = %user.name(),
                            error = %error,
                            "Authorization backend rejected credentials, skipping"
                        ),
                        SecurityErrorKind::Unreachable | SecurityErrorKind::Uninitialized => warn!(
                            domain = %entry.name,
                            backend = %error.backend_type(),
                            user = %user.name(),
                            error = %error,
                            "Authorization backend unavailable, skipping"
                        ),
                    }
                    report.failures.push(BackendFailure {
                        domain: entry.name.clone(),
                        error,
                    });
                },
            }
        }

        report.state = ResolutionState::Resolved;
        report
    }

    async fn invoke(
        &self,
        entry: &ChainEntry,
        user: &mut User,
        credentials: &AuthCredentials,
    ) -> Result<(), SecurityError> {
        let call = entry.backend.fill_roles(user, credentials);
        match self.backend_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                SecurityError::unreachable(
                    entry.backend_type(),
                    format!("timed out after {}ms", limit.as_millis()),
                )
            })?,
            None => call.await,
        }
    }
}
