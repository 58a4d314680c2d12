//! Authorization backend trait.

use async_trait::async_trait;
use tracing::error;

use crate::{AuthCredentials, SecurityError, User};

/// Trait for authorization backends.
///
/// A backend populates an already authenticated [`User`] with the roles it
/// holds in some external system of record. Backends are built once from
/// configuration and shared by every resolution pass, so implementations
/// keep no per-call state outside local variables.
///
/// `fill_roles` is never called for users served from the role cache, and
/// implementations must not cache results themselves.
#[async_trait]
pub trait AuthorizationBackend: Send + Sync {
    /// Returns the type of this backend for logging/debugging.
    fn backend_type(&self) -> &str;

    /// Adds the user's roles from the system of record.
    ///
    /// # Arguments
    ///
    /// * `user` - The authenticated user to populate
    /// * `credentials` - Credentials for the backend, currently always empty
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Zero or more roles were added (finding none is not an error)
    /// * `Err(SecurityError)` - The backend is unreachable or refused the credentials
    async fn fill_roles(
        &self,
        user: &mut User,
        credentials: &AuthCredentials,
    ) -> Result<(), SecurityError>;
}

/// Outcome of backend construction.
///
/// Constructors never fail. A backend that could not be set up stores
/// `Failed` and rejects every later call with [`SecurityError::Uninitialized`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    /// Ready to serve calls.
    Ready,
    /// Construction failed with the given reason.
    Failed(String),
}

impl BackendStatus {
    /// Records a construction failure and logs it.
    pub fn failed(backend: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        error!(backend = %backend, reason = %reason, "Authorization backend failed to initialize");
        Self::Failed(reason)
    }

    /// Fails fast if construction did not succeed.
    pub fn check(&self, backend: &str) -> Result<(), SecurityError> {
        match self {
            Self::Ready => Ok(()),
            Self::Failed(reason) => Err(SecurityError::uninitialized(backend, reason.clone())),
        }
    }

    /// Returns `true` if the backend is ready.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}
