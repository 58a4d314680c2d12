//! Authenticated user record.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::AuthzError;

/// Authenticated user and the roles it accumulates during resolution.
///
/// The principal name is fixed at construction. Roles and attributes can
/// only be added: backends receive `&mut User` for one call and have no
/// way to remove what an earlier backend contributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UserRecord")]
pub struct User {
    name: String,
    roles: BTreeSet<String>,
    attributes: BTreeMap<String, String>,
}

/// Wire form of [`User`], checked through [`User::new`] on deserialization.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UserRecord {
    name: String,
    #[serde(default)]
    roles: BTreeSet<String>,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
}

impl TryFrom<UserRecord> for User {
    type Error = AuthzError;

    fn try_from(record: UserRecord) -> Result<Self, Self::Error> {
        let mut user = User::new(record.name)?;
        user.add_roles(record.roles);
        for (key, value) in record.attributes {
            user.add_attribute(key, value);
        }
        Ok(user)
    }
}

impl User {
    /// Creates a user with no roles.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::InvalidPrincipal`] if `name` is empty or blank.
    pub fn new(name: impl Into<String>) -> Result<Self, AuthzError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AuthzError::InvalidPrincipal(
                "principal name cannot be empty".into(),
            ));
        }

        Ok(Self {
            name,
            roles: BTreeSet::new(),
            attributes: BTreeMap::new(),
        })
    }

    /// Principal name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Roles accumulated so far, in sorted order.
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    /// Backend-supplied attributes.
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Checks whether the user holds `role`.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Adds a role. Returns `true` if it was not already present.
    ///
    /// Blank role names are ignored.
    pub fn add_role(&mut self, role: impl Into<String>) -> bool {
        let role = role.into();
        if role.trim().is_empty() {
            return false;
        }
        self.roles.insert(role)
    }

    /// Adds several roles. Returns how many were new.
    pub fn add_roles<I, S>(&mut self, roles: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        roles
            .into_iter()
            .map(|role| self.add_role(role))
            .filter(|added| *added)
            .count()
    }

    /// Sets an attribute unless a previous backend already set it.
    ///
    /// Returns `true` if the attribute was stored.
    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.attributes.contains_key(&key) {
            debug!(user = %self.name, attribute = %key, "Attribute already set, keeping first value");
            return false;
        }
        self.attributes.insert(key, value.into());
        true
    }

    /// Merges roles and attributes contributed to a working copy of this user.
    pub(crate) fn absorb(&mut self, other: User) {
        self.roles.extend(other.roles);
        for (key, value) in other.attributes {
            self.attributes.entry(key).or_insert(value);
        }
    }
}
