//! Scripted backends for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::{AuthCredentials, AuthorizationBackend, SecurityError, SecurityErrorKind, User};

enum Outcome {
    Roles(Vec<String>),
    Fail(SecurityErrorKind),
    PartialThenFail(Vec<String>),
    Slow(Duration, Vec<String>),
}

/// Backend that returns a fixed outcome and counts its calls.
pub(crate) struct MockBackend {
    name: String,
    outcome: Outcome,
    calls: AtomicUsize,
}

impl MockBackend {
    fn build(name: &str, outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            outcome,
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn roles<const N: usize>(name: &str, roles: [&str; N]) -> Arc<Self> {
        Self::build(name, Outcome::Roles(roles.map(String::from).to_vec()))
    }

    pub(crate) fn failing(name: &str, kind: SecurityErrorKind) -> Arc<Self> {
        Self::build(name, Outcome::Fail(kind))
    }

    pub(crate) fn partial_then_fail<const N: usize>(name: &str, roles: [&str; N]) -> Arc<Self> {
        Self::build(name, Outcome::PartialThenFail(roles.map(String::from).to_vec()))
    }

    pub(crate) fn slow<const N: usize>(name: &str, delay: Duration, roles: [&str; N]) -> Arc<Self> {
        Self::build(name, Outcome::Slow(delay, roles.map(String::from).to_vec()))
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn error(name: &str, kind: SecurityErrorKind) -> SecurityError {
    match kind {
        SecurityErrorKind::Unreachable => SecurityError::unreachable(name, "connection refused"),
        SecurityErrorKind::InsufficientCredentials => {
            SecurityError::insufficient_credentials(name, "bind rejected")
        },
        SecurityErrorKind::Uninitialized => SecurityError::uninitialized(name, "bad config"),
    }
}

#[async_trait]
impl AuthorizationBackend for MockBackend {
    fn backend_type(&self) -> &str {
        &self.name
    }

    async fn fill_roles(
        &self,
        user: &mut User,
        _credentials: &AuthCredentials,
    ) -> Result<(), SecurityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Outcome::Roles(roles) => {
                user.add_roles(roles.iter().cloned());
                Ok(())
            },
            Outcome::Fail(kind) => Err(error(&self.name, *kind)),
            Outcome::PartialThenFail(roles) => {
                user.add_roles(roles.iter().cloned());
                Err(error(&self.name, SecurityErrorKind::Unreachable))
            },
            Outcome::Slow(delay, roles) => {
                tokio::time::sleep(*delay).await;
                user.add_roles(roles.iter().cloned());
                Ok(())
            },
        }
    }
}
