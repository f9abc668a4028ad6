//! repo-info-proxy - GitHub repository metadata at the edge
//!
//! A small HTTP middleware that looks up repository metadata on GitHub,
//! normalizes it into one flat record per repository, and serves it with
//! HTTP caching headers. Everything else is passed through to a downstream
//! handler.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface (`serve`, `lookup`, `completion`)
//! - [`server`] - axum router, request validation, downstream fallback
//! - [`lookup`] - Single and batch repository lookups
//! - [`forge`] - The upstream host abstraction and its GitHub implementation
//! - [`core`] - Reference normalization, result types, configuration
//!
//! # Failure Model
//!
//! 1. A failing repository lookup becomes a degraded record, never an error
//! 2. A batch always answers 200 with one entry per distinct input
//! 3. Only malformed requests fail the whole request

pub mod cli;
pub mod core;
pub mod forge;
pub mod lookup;
pub mod server;
