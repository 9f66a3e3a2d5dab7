//! Core business logic module
//!
//! External tools are reached through the [`builder::PackageBuild`] and
//! [`checker::AbiToolchain`] traits; their implementations live in
//! [`crate::infra`].
//!
//! # Submodules
//!
//! - [`control`] - `debian/control` parsing
//! - [`descriptor`] - Source tree discovery and the descriptor table
//! - [`resolver`] - Dependency graph and build order
//! - [`builder`] - Build orchestration
//! - [`artifact`] - Package file name conventions
//! - [`version`] - Upstream version parsing and bump detection
//! - [`abi`] - ABI status classification and policy verdicts
//! - [`report`] - ABI check records and the session report
//! - [`manifest_map`] - Open/proprietary artifact classification
//! - [`checker`] - ABI check pipeline
//! - [`doctor`] - Host tool checks

pub mod abi;
pub mod artifact;
pub mod builder;
pub mod checker;
pub mod control;
pub mod descriptor;
pub mod doctor;
pub mod manifest_map;
pub mod report;
pub mod resolver;
pub mod version;
