//! Backend serving roles from an inline mapping.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{AuthCredentials, AuthorizationBackend, BackendStatus, SecurityError, User};

/// Principal to roles/attributes mapping.
///
/// Shared by the `static` backend (inline in settings) and the `file`
/// backend (read from disk).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleMapping {
    /// Roles per principal.
    #[serde(default)]
    pub users: HashMap<String, Vec<String>>,
    /// Attributes per principal.
    #[serde(default)]
    pub attributes: HashMap<String, HashMap<String, String>>,
}

impl RoleMapping {
    /// Adds the mapped roles and attributes of `user`. Returns the number of new roles.
    pub fn apply(&self, user: &mut User) -> usize {
        let added = self
            .users
            .get(user.name())
            .map_or(0, |roles| user.add_roles(roles.iter().cloned()));

        if let Some(attributes) = self.attributes.get(user.name()) {
            for (key, value) in attributes {
                user.add_attribute(key.clone(), value.clone());
            }
        }
        added
    }
}

/// Authorization backend with a role mapping held in its settings.
///
/// ```json
/// { "users": { "alice": ["admin"] }, "attributes": { "alice": { "team": "ops" } } }
/// ```
pub struct StaticBackend {
    mapping: RoleMapping,
    status: BackendStatus,
}

impl StaticBackend {
    /// Backend type name.
    pub const TYPE: &'static str = "static";

    /// Creates the backend. Malformed settings yield a backend that fails
    /// every call.
    pub fn new(settings: &Map<String, Value>, _config_path: &Path) -> Self {
        match serde_json::from_value::<RoleMapping>(Value::Object(settings.clone())) {
            Ok(mapping) => Self {
                mapping,
                status: BackendStatus::Ready,
            },
            Err(e) => Self {
                mapping: RoleMapping::default(),
                status: BackendStatus::failed(Self::TYPE, format!("invalid settings: {e}")),
            },
        }
    }

    /// Construction status.
    pub fn status(&self) -> &BackendStatus {
        &self.status
    }
}

#[async_trait]
impl AuthorizationBackend for StaticBackend {
    fn backend_type(&self) -> &str {
        Self::TYPE
    }

    async fn fill_roles(
        &self,
        user: &mut User,
        _credentials: &AuthCredentials,
    ) -> Result<(), SecurityError> {
        self.status.check(Self::TYPE)?;
        self.mapping.apply(user);
        Ok(())
    }
}
