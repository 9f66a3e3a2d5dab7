//! Infrastructure layer
//!
//! Handles all I/O operations: filesystem and external processes.
//! This module is the only place where side effects occur.

pub mod abi_toolchain;
pub mod abipkgdiff;
pub mod apt;
pub mod dirs;
pub mod dpkg;
pub mod filesystem;
pub mod process;
pub mod sbuild;
