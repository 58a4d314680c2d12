//! Authorization error types.

use std::fmt;

use thiserror::Error;

/// Category of a [`SecurityError`], used by the chain for audit logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityErrorKind {
    /// The system of record could not be contacted.
    Unreachable,
    /// Credentials were not sufficient to authenticate to the backend.
    InsufficientCredentials,
    /// The backend failed to initialize and refuses every call.
    Uninitialized,
}

impl fmt::Display for SecurityErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unreachable => "unreachable",
            Self::InsufficientCredentials => "insufficient_credentials",
            Self::Uninitialized => "uninitialized",
        };
        f.write_str(s)
    }
}

/// Errors raised by an authorization backend while filling roles.
///
/// Every variant names the backend type so a failure can be attributed
/// without any extra context from the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SecurityError {
    /// The backing system of record is unreachable (network, I/O, timeout).
    #[error("authorization backend '{backend}' unreachable: {reason}")]
    Unreachable {
        /// Backend type.
        backend: String,
        /// Failure reason.
        reason: String,
    },

    /// Credentials are insufficient to authenticate to the backend.
    #[error("insufficient credentials for authorization backend '{backend}': {reason}")]
    InsufficientCredentials {
        /// Backend type.
        backend: String,
        /// Failure reason.
        reason: String,
    },

    /// The backend could not be set up from its configuration.
    #[error("authorization backend '{backend}' not initialized: {reason}")]
    Uninitialized {
        /// Backend type.
        backend: String,
        /// Initialization failure recorded at construction.
        reason: String,
    },
}

impl SecurityError {
    /// Creates an unreachable-backend error.
    pub fn unreachable(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unreachable {
            backend: backend.into(),
            reason: reason.into(),
        }
    }

    /// Creates an insufficient-credentials error.
    pub fn insufficient_credentials(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InsufficientCredentials {
            backend: backend.into(),
            reason: reason.into(),
        }
    }

    /// Creates an error for a backend whose construction failed.
    pub fn uninitialized(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Uninitialized {
            backend: backend.into(),
            reason: reason.into(),
        }
    }

    /// Returns the type of the backend that raised this error.
    pub fn backend_type(&self) -> &str {
        match self {
            Self::Unreachable { backend, .. }
            | Self::InsufficientCredentials { backend, .. }
            | Self::Uninitialized { backend, .. } => backend,
        }
    }

    /// Returns the failure reason.
    pub fn reason(&self) -> &str {
        match self {
            Self::Unreachable { reason, .. }
            | Self::InsufficientCredentials { reason, .. }
            | Self::Uninitialized { reason, .. } => reason,
        }
    }

    /// Returns the error category.
    pub fn kind(&self) -> SecurityErrorKind {
        match self {
            Self::Unreachable { .. } => SecurityErrorKind::Unreachable,
            Self::InsufficientCredentials { .. } => SecurityErrorKind::InsufficientCredentials,
            Self::Uninitialized { .. } => SecurityErrorKind::Uninitialized,
        }
    }
}

/// Host-level errors: identity construction, configuration and chain assembly.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Principal name is empty.
    #[error("invalid principal: {0}")]
    InvalidPrincipal(String),

    /// No factory registered for the configured backend type.
    #[error("unknown authorization backend type: {0}")]
    UnknownBackendType(String),

    /// Configuration is structurally valid JSON but semantically wrong.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    ConfigIo {
        /// Configuration file path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid JSON for [`crate::AuthzConfig`].
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
