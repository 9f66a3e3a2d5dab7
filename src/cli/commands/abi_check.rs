//! CLI command for `debforge abi-check`
//!
//! The exit status is the aggregate return bitmask of every compared
//! package, or [`ABORTED_EXIT`] when the run stopped on a fatal error or a
//! package comparison was aborted.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use crate::cli::output::{create_spinner, display_error, is_json, print_detail, print_info, print_warning};
use crate::config::{defaults, DebforgeConfig};
use crate::core::abi::AbiReturnCode;
use crate::core::checker::{AbiCheckOptions, AbiChecker};
use crate::core::report::AbiSession;
use crate::infra::abi_toolchain::SystemAbiToolchain;
use crate::infra::dirs::DebforgeDirs;

/// Exit status of a run that did not finish every comparison
pub const ABORTED_EXIT: i32 = 255;

/// Arguments of `debforge abi-check`
#[derive(Args, Debug, Clone, Default)]
pub struct AbiCheckArgs {
    /// Folder with the new packages (.deb, optional -dev .deb, optional -dbgsym .ddeb)
    #[arg(long)]
    pub new_package_dir: PathBuf,

    /// Treat every subfolder of the package dir as one repository
    #[arg(long)]
    pub multi: bool,

    /// Repository line the old packages are downloaded from
    #[arg(long)]
    pub apt_server_config: Option<String>,

    /// Compare against this old version instead of the latest
    #[arg(long)]
    pub old_version: Option<String>,

    /// Write the report to this file
    #[arg(long)]
    pub result_file: Option<PathBuf>,

    /// Remove the extracted temporary folders after the run
    #[arg(long)]
    pub delete_temp: bool,
}

/// Resolve the check options from flags and configuration
pub fn check_options(args: &AbiCheckArgs, config: &DebforgeConfig) -> AbiCheckOptions {
    AbiCheckOptions {
        apt_server_config: args
            .apt_server_config
            .clone()
            .unwrap_or_else(|| config.abi_apt_server_config().to_string()),
        old_version: args.old_version.clone().filter(|v| !v.is_empty()),
        keep_temp: !args.delete_temp && config.abi_keep_temp(),
        non_reachable_types: config.non_reachable_types(),
    }
}

/// Where the report is written, if anywhere
pub fn report_path(args: &AbiCheckArgs, package_dir: &Path) -> Option<PathBuf> {
    match (&args.result_file, args.multi) {
        (Some(file), _) => Some(file.clone()),
        (None, true) => Some(package_dir.join(defaults::ABI_REPORT_FILE)),
        (None, false) => None,
    }
}

/// Process exit status for a finished run
pub fn exit_code(session: &AbiSession, result: AbiReturnCode) -> i32 {
    if session.aborted().is_empty() {
        i32::from(result.bits())
    } else {
        ABORTED_EXIT
    }
}

/// Execute the abi-check command
pub fn execute(args: &AbiCheckArgs) -> Result<i32> {
    let package_dir = std::path::absolute(&args.new_package_dir)?;
    let config = DebforgeConfig::load(None, &DebforgeDirs::new())?;
    let options = check_options(args, &config);
    tracing::debug!("ABI check options: {options:?}");

    let mut checker = AbiChecker::new(SystemAbiToolchain, options);
    let mut session = AbiSession::new();

    let spinner = create_spinner("Comparing packages against the published versions...");
    let outcome = if args.multi {
        checker.check_repositories(&package_dir, &mut session)
    } else {
        checker.check_repository(&package_dir, &mut session)
    };
    spinner.finish_and_clear();

    if let Some(path) = report_path(args, &package_dir) {
        let path = std::path::absolute(&path)?;
        session.write_report(&path)?;
        print_detail(&format!("Report written to {}", path.display()));
    }

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            display_error(&anyhow::Error::new(e).context("ABI check stopped"));
            return Ok(ABORTED_EXIT);
        }
    };

    if is_json() {
        let json = serde_json::json!({
            "result": result,
            "records": session.records(),
            "aborted": session.aborted(),
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        for record in session.records() {
            match &record.verdict {
                Some(verdict) => print_info(&format!("{}: {verdict}", record.package)),
                None => print_info(&format!(
                    "{}: {}",
                    record.package,
                    record.status.map_or("not compared", |s| s.label())
                )),
            }
        }
        for aborted in session.aborted() {
            print_warning(&format!("{}: aborted ({})", aborted.package, aborted.reason));
        }
        print_info(&format!("ABI check result: {result}"));
    }

    Ok(exit_code(&session, result))
}
