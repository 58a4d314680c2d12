//! Backend reading roles from a JSON mapping file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use super::static_roles::RoleMapping;
use crate::{AuthCredentials, AuthorizationBackend, BackendStatus, SecurityError, User};

/// Authorization backend whose system of record is a JSON file.
///
/// Settings: `{ "path": "roles.json" }`. Relative paths are resolved
/// against the configuration directory. The file uses the same format as
/// the `static` backend settings and is read on every call, so edits are
/// picked up once cached users expire.
pub struct FileBackend {
    path: PathBuf,
    status: BackendStatus,
}

impl FileBackend {
    /// Backend type name.
    pub const TYPE: &'static str = "file";

    /// Creates the backend. A missing or non-string `path` setting yields a
    /// backend that fails every call.
    pub fn new(settings: &Map<String, Value>, config_path: &Path) -> Self {
        match settings.get("path").and_then(Value::as_str) {
            Some(path) if !path.trim().is_empty() => Self {
                path: config_path.join(path),
                status: BackendStatus::Ready,
            },
            _ => Self {
                path: PathBuf::new(),
                status: BackendStatus::failed(Self::TYPE, "missing 'path' setting"),
            },
        }
    }

    /// Resolved mapping file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Construction status.
    pub fn status(&self) -> &BackendStatus {
        &self.status
    }

    async fn load(&self) -> Result<RoleMapping, SecurityError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SecurityError::unreachable(
                Self::TYPE,
                format!("failed to read {}: {e}", self.path.display()),
            )
        })?;

        serde_json::from_str(&raw).map_err(|e| {
            SecurityError::unreachable(
                Self::TYPE,
                format!("failed to parse {}: {e}", self.path.display()),
            )
        })
    }
}

#[async_trait]
impl AuthorizationBackend for FileBackend {
    fn backend_type(&self) -> &str {
        Self::TYPE
    }

    async fn fill_roles(
        &self,
        user: &mut User,
        _credentials: &AuthCredentials,
    ) -> Result<(), SecurityError> {
        self.status.check(Self::TYPE)?;

        let mapping = self.load().await?;
        let added = mapping.apply(user);
        debug!(user = %user.name(), path = %self.path.display(), added, "Roles loaded from file");

        Ok(())
    }
}
