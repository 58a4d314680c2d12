//! # Rolegate Authz
//!
//! Role resolution for already authenticated users.
//!
//! An [`AuthorizationPipeline`] looks the user up in a [`RoleCache`]; on a
//! miss it runs a [`ResolutionChain`] of [`AuthorizationBackend`]s, each of
//! which adds the roles it finds in its system of record. A failing backend
//! is recorded and skipped, never aborting the pass.
//!
//! ## Built-in Backends
//!
//! - `noop` - contributes nothing
//! - `static` - inline principal to roles mapping
//! - `file` - JSON mapping file read on each call

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod backends;
pub mod cache;
pub mod chain;
pub mod config;
pub mod credentials;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod user;

#[cfg(test)]
mod testing;

pub use backend::{AuthorizationBackend, BackendStatus};
pub use cache::{InMemoryRoleCache, NoCache, RoleCache, MAX_CACHE_TTL};
pub use chain::{BackendFailure, ChainEntry, ResolutionChain, ResolutionReport, ResolutionState};
pub use config::{AuthzConfig, BackendDescriptor, CacheConfig};
pub use credentials::{AuthCredentials, CredentialPurpose};
pub use error::{AuthzError, SecurityError, SecurityErrorKind};
pub use pipeline::{Authorized, AuthorizationPipeline};
pub use registry::{BackendFactory, BackendRegistry};
pub use user::User;
