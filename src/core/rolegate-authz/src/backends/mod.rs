//! Built-in authorization backends.
//!
//! Every backend is constructed from a settings map and a path hint and
//! never fails to construct; see [`crate::BackendStatus`].

pub mod file;
pub mod noop;
pub mod static_roles;

pub use file::FileBackend;
pub use noop::NoopBackend;
pub use static_roles::StaticBackend;
