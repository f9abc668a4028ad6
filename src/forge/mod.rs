//! forge
//!
//! Abstraction over the upstream repository host.
//!
//! # Architecture
//!
//! The [`RepoHost`] trait is the only thing the lookup layer knows about the
//! upstream. Production code uses [`github::GitHubHost`]; tests use
//! [`mock::MockHost`] or point `GitHubHost` at a local mock server.
//!
//! # Modules
//!
//! - `traits`: `RepoHost` trait, `HostError`, upstream wire types, `Credential`
//! - [`github`]: GitHub REST implementation
//! - [`mock`]: In-memory implementation for deterministic testing

pub mod github;
pub mod mock;
mod traits;

pub use traits::*;
