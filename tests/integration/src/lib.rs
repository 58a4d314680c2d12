//! Integration tests for Rolegate role resolution.
//!
//! These tests drive the public API end to end: configuration on disk,
//! registry, chain, cache and pipeline.

// Allow unwrap() in tests - panics are acceptable for test assertions
#![allow(clippy::disallowed_methods)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tempfile::TempDir;

use rolegate_authz::{
    AuthCredentials, AuthorizationBackend, AuthorizationPipeline, AuthzConfig, BackendRegistry,
    SecurityError, User,
};

// ============================================================================
// Scripted Backend
// ============================================================================

/// What a [`ScriptedBackend`] does when called.
#[derive(Debug, Clone)]
pub enum Script {
    /// Add these roles.
    Roles(Vec<String>),
    /// Fail as unreachable.
    Unreachable,
    /// Fail with insufficient credentials.
    Rejected,
}

/// Backend with a fixed behavior that counts its calls.
pub struct ScriptedBackend {
    name: String,
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    /// Creates a backend adding `roles`.
    pub fn roles(name: &str, roles: &[&str]) -> Arc<Self> {
        Self::new(name, Script::Roles(roles.iter().map(|r| r.to_string()).collect()))
    }

    /// Creates a backend with the given script.
    pub fn new(name: &str, script: Script) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            script,
            calls: AtomicUsize::new(0),
        })
    }

    /// Number of `fill_roles` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthorizationBackend for ScriptedBackend {
    fn backend_type(&self) -> &str {
        &self.name
    }

    async fn fill_roles(
        &self,
        user: &mut User,
        credentials: &AuthCredentials,
    ) -> Result<(), SecurityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(credentials.is_empty(), "chain must pass empty credentials");

        match &self.script {
            Script::Roles(roles) => {
                user.add_roles(roles.iter().cloned());
                Ok(())
            },
            Script::Unreachable => Err(SecurityError::unreachable(&self.name, "connection refused")),
            Script::Rejected => Err(SecurityError::insufficient_credentials(
                &self.name,
                "anonymous bind not allowed",
            )),
        }
    }
}

// ============================================================================
// Config Fixtures
// ============================================================================

/// A configuration directory on disk.
pub struct ConfigDir {
    dir: TempDir,
}

impl ConfigDir {
    /// Creates an empty configuration directory.
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new().context("Failed to create temp dir")?,
        })
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `contents` to `name` inside the directory.
    pub fn write(&self, name: &str, contents: &serde_json::Value) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        std::fs::write(&path, serde_json::to_vec_pretty(contents)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Loads `rolegate.json` and builds a pipeline with the built-in backends.
    pub fn pipeline(&self) -> Result<AuthorizationPipeline> {
        let config = AuthzConfig::from_file(self.path().join("rolegate.json"))?;
        let pipeline =
            AuthorizationPipeline::from_config(&config, &BackendRegistry::with_builtin(), self.path())?;
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rolegate_authz::{
        ChainEntry, InMemoryRoleCache, ResolutionChain, ResolutionState, RoleCache,
        SecurityErrorKind,
    };
    use serde_json::json;

    use super::*;

    fn pipeline_of(backends: &[Arc<ScriptedBackend>]) -> AuthorizationPipeline {
        let entries = backends
            .iter()
            .map(|b| ChainEntry::new(b.backend_type().to_string(), b.clone()))
            .collect();
        AuthorizationPipeline::new(
            ResolutionChain::new(entries),
            Arc::new(InMemoryRoleCache::new(Duration::from_secs(300))),
        )
    }

    fn roles(user: &User) -> Vec<&str> {
        user.roles().iter().map(String::as_str).collect()
    }

    #[tokio::test]
    async fn test_alice_unreachable_backend_is_isolated() {
        let a = ScriptedBackend::roles("backend-a", &["admin"]);
        let b = ScriptedBackend::new("backend-b", Script::Unreachable);
        let pipeline = pipeline_of(&[a, b]);

        let result = pipeline.authorize(User::new("alice").unwrap()).await;

        assert_eq!(roles(&result.user), ["admin"]);
        assert_eq!(result.report.state, ResolutionState::Resolved);
        assert_eq!(result.report.failures.len(), 1);
        let failure = &result.report.failures[0];
        assert_eq!(failure.error.backend_type(), "backend-b");
        assert_eq!(failure.error.kind(), SecurityErrorKind::Unreachable);
    }

    #[tokio::test]
    async fn test_bob_overlapping_roles_union() {
        let a = ScriptedBackend::roles("backend-a", &["readonly"]);
        let c = ScriptedBackend::roles("backend-c", &["readonly", "auditor"]);
        let pipeline = pipeline_of(&[a, c]);

        let result = pipeline.authorize(User::new("bob").unwrap()).await;

        assert_eq!(roles(&result.user), ["auditor", "readonly"]);
        assert!(result.report.is_clean());
    }

    #[tokio::test]
    async fn test_carol_cache_hit_skips_chain() {
        let a = ScriptedBackend::roles("backend-a", &["admin"]);
        let pipeline = pipeline_of(&[a.clone()]);
        let mut carol = User::new("carol").unwrap();
        carol.add_role("superuser");
        pipeline.cache().put(carol);

        let result = pipeline.authorize(User::new("carol").unwrap()).await;

        assert!(result.report.cache_hit);
        assert_eq!(roles(&result.user), ["superuser"]);
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn test_union_regardless_of_failure_interleaving() {
        let outcomes = [
            Script::Roles(vec!["r1".into()]),
            Script::Unreachable,
            Script::Roles(vec![]),
            Script::Rejected,
            Script::Roles(vec!["r2".into(), "r1".into()]),
        ];

        // Rotate the outcome sequence so every position sees every outcome.
        for shift in 0..outcomes.len() {
            let backends: Vec<_> = (0..outcomes.len())
                .map(|i| {
                    let script = outcomes[(i + shift) % outcomes.len()].clone();
                    ScriptedBackend::new(&format!("b{i}"), script)
                })
                .collect();
            let pipeline = pipeline_of(&backends);

            let result = pipeline.authorize(User::new("dave").unwrap()).await;

            assert_eq!(roles(&result.user), ["r1", "r2"], "shift {shift}");
            assert_eq!(result.report.failures.len(), 2);
            assert_eq!(result.report.succeeded.len(), 3);
            assert!(backends.iter().all(|b| b.calls() == 1));
        }
    }

    #[tokio::test]
    async fn test_rejected_credentials_reported_distinctly() {
        let rejected = ScriptedBackend::new("directory", Script::Rejected);
        let pipeline = pipeline_of(&[rejected]);

        let result = pipeline.authorize(User::new("erin").unwrap()).await;

        assert_eq!(
            result.report.failures[0].error.kind(),
            SecurityErrorKind::InsufficientCredentials
        );
        assert!(result.user.roles().is_empty());
        assert!(pipeline.cache().get("erin").is_none());
    }

    #[tokio::test]
    async fn test_config_on_disk_with_file_backend() {
        let dir = ConfigDir::new().unwrap();
        dir.write(
            "roles.json",
            &json!({
                "users": { "alice": ["admin"], "bob": ["readonly"] },
                "attributes": { "alice": { "department": "it" } }
            }),
        )
        .unwrap();
        dir.write(
            "rolegate.json",
            &json!({
                "cache": { "ttl_secs": 60 },
                "backends": [
                    { "name": "mapping-file", "type": "file", "order": 1,
                      "config": { "path": "roles.json" } },
                    { "name": "inline", "type": "static", "order": 0,
                      "config": { "users": { "alice": ["ops"] } } },
                    { "name": "broken", "type": "file", "order": 2 }
                ]
            }),
        )
        .unwrap();

        let pipeline = dir.pipeline().unwrap();
        let alice = pipeline.authorize(User::new("alice").unwrap()).await;

        assert_eq!(roles(&alice.user), ["admin", "ops"]);
        assert_eq!(alice.user.attributes()["department"], "it");
        assert_eq!(alice.report.succeeded, ["inline", "mapping-file"]);
        assert_eq!(alice.report.failures.len(), 1);
        assert_eq!(alice.report.failures[0].domain, "broken");
        assert_eq!(
            alice.report.failures[0].error.kind(),
            SecurityErrorKind::Uninitialized
        );
    }

    #[tokio::test]
    async fn test_cached_user_survives_backend_outage() {
        let dir = ConfigDir::new().unwrap();
        let mapping = dir
            .write("roles.json", &json!({ "users": { "frank": ["reader"] } }))
            .unwrap();
        dir.write(
            "rolegate.json",
            &json!({ "backends": [ { "type": "file", "config": { "path": "roles.json" } } ] }),
        )
        .unwrap();
        let pipeline = dir.pipeline().unwrap();

        let first = pipeline.authorize(User::new("frank").unwrap()).await;
        std::fs::remove_file(&mapping).unwrap();
        let second = pipeline.authorize(User::new("frank").unwrap()).await;

        assert!(!first.report.cache_hit);
        assert!(second.report.cache_hit);
        assert_eq!(roles(&second.user), ["reader"]);

        pipeline.invalidate("frank");
        let third = pipeline.authorize(User::new("frank").unwrap()).await;
        assert!(third.report.all_failed());
        assert!(third.user.roles().is_empty());
    }

    #[test]
    fn test_unknown_backend_type_rejected() {
        let dir = ConfigDir::new().unwrap();
        dir.write("rolegate.json", &json!({ "backends": [ { "type": "ldap" } ] }))
            .unwrap();

        let err = dir.pipeline().err().expect("ldap is not registered");
        assert!(err.to_string().contains("unknown authorization backend type: ldap"));
    }
}
