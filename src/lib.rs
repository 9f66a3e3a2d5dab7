//! Debforge - Debian package build orchestrator and ABI gate
//!
//! Builds a tree of Debian source packages in build-dependency order inside
//! an sbuild chroot, and checks freshly built libraries for ABI breaks
//! against the previously published packages.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Business logic
//! - [`infra`] - Infrastructure layer (filesystem, processes)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;
