//! Backend that contributes no roles.

use std::path::Path;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{AuthCredentials, AuthorizationBackend, SecurityError, User};

/// Authorization backend that always succeeds without adding roles.
///
/// Useful to keep a chain slot configured while its real backend is off.
#[derive(Debug, Default)]
pub struct NoopBackend;

impl NoopBackend {
    /// Backend type name.
    pub const TYPE: &'static str = "noop";

    /// Creates the backend. Settings are ignored.
    pub fn new(_settings: &Map<String, Value>, _config_path: &Path) -> Self {
        Self
    }
}

#[async_trait]
impl AuthorizationBackend for NoopBackend {
    fn backend_type(&self) -> &str {
        Self::TYPE
    }

    async fn fill_roles(
        &self,
        _user: &mut User,
        _credentials: &AuthCredentials,
    ) -> Result<(), SecurityError> {
        Ok(())
    }
}
