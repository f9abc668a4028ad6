//! core
//!
//! Domain types and configuration.
//!
//! # Modules
//!
//! - [`reference`] - Repository reference normalization
//! - [`types`] - Lookup result records
//! - [`config`] - Configuration schema, loading, and resolved settings

pub mod config;
pub mod reference;
pub mod types;
