//! vendor-sync library.
//!
//! Synchronises a set of third-party front-end libraries into a local
//! vendor tree, driven by a declarative manifest. Used by the
//! `vendor-sync` CLI binary and consumable programmatically for testing.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`error`] - Fatal error types for the run
//! - [`extract`] - Tarball extraction with traversal protection
//! - [`fetch`] - HTTP download abstraction (redirects disabled)
//! - [`integrity`] - SRI integrity strings and content hashing
//! - [`manifest`] - Restricted indentation-based manifest parser
//! - [`output`] - Progress and report formatting
//! - [`pattern`] - Brace expansion and glob matching
//! - [`resource`] - Typed view over manifest entries
//! - [`sync`] - Per-module synchronisation orchestration

pub mod cli;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod integrity;
pub mod manifest;
pub mod output;
pub mod pattern;
pub mod resource;
pub mod sync;
