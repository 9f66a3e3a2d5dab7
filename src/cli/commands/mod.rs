//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod abi_check;
pub mod build;
pub mod doctor;
pub mod order;

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build source packages in dependency order with sbuild
    Build(build::BuildArgs),

    /// Print the build order of a source tree without building
    Order {
        /// Directory searched for debian/control files
        #[arg(long, default_value = "sources")]
        sources: PathBuf,
    },

    /// Compare freshly built packages against the published ones
    AbiCheck(abi_check::AbiCheckArgs),

    /// Check system dependencies
    Doctor {
        /// Workspace whose configuration is checked as well
        #[arg(long)]
        workspace: Option<PathBuf>,
    },
}

impl Commands {
    /// Execute the command, returning the process exit code
    pub fn run(self) -> Result<i32> {
        match self {
            Self::Build(args) => build::execute(&args),
            Self::Order { sources } => order::execute(&sources),
            Self::AbiCheck(args) => abi_check::execute(&args),
            Self::Doctor { workspace } => doctor::execute(workspace.as_deref()),
        }
    }
}
