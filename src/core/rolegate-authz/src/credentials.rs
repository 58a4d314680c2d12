//! Credentials handed to authorization backends.

use std::fmt;

use zeroize::Zeroizing;

/// Intended use of a credential token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialPurpose {
    /// Authenticate to an authorization backend.
    #[default]
    Authorization,
}

/// Credentials for authenticating to an authorization backend.
///
/// The resolution chain currently always passes [`AuthCredentials::empty`].
/// Backends must accept empty credentials; the parameter is kept in the
/// backend contract so a later protocol can pass real material.
#[derive(Clone, Default)]
pub struct AuthCredentials {
    username: Option<String>,
    secret: Option<Zeroizing<Vec<u8>>>,
    purpose: CredentialPurpose,
}

impl AuthCredentials {
    /// Empty credentials.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Credentials with a username and secret material.
    pub fn new(username: impl Into<String>, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            username: Some(username.into()),
            secret: Some(Zeroizing::new(secret.into())),
            purpose: CredentialPurpose::Authorization,
        }
    }

    /// Username, if any.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Secret material, if any.
    pub fn secret(&self) -> Option<&[u8]> {
        self.secret.as_ref().map(|s| s.as_slice())
    }

    /// Intended use.
    pub fn purpose(&self) -> CredentialPurpose {
        self.purpose
    }

    /// Returns `true` when neither a username nor a secret is present.
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.secret.as_ref().map_or(true, |s| s.is_empty())
    }
}

impl fmt::Debug for AuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCredentials")
            .field("username", &self.username)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("purpose", &self.purpose)
            .finish()
    }
}
