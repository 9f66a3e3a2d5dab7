//! abipkgdiff invocation

use crate::core::checker::{DiffInputs, DiffOutcome};
use crate::error::ProcessError;
use crate::infra::process;

/// Program name
pub const ABIPKGDIFF: &str = "abipkgdiff";

/// Build the argument list for a comparison
///
/// Development and debug packages are only passed when both sides have
/// one; abipkgdiff requires them in pairs.
pub fn diff_args(inputs: &DiffInputs) -> Vec<String> {
    let mut args = Vec::new();

    if inputs.non_reachable_types {
        args.push("--non-reachable-types".to_string());
    }

    match (&inputs.old_dev, &inputs.new_dev) {
        (Some(old), Some(new)) => {
            args.push("--devel-pkg1".to_string());
            args.push(old.display().to_string());
            args.push("--devel-pkg2".to_string());
            args.push(new.display().to_string());
        }
        _ => tracing::warn!("One or both of the -dev packages are missing, comparison may miss information"),
    }

    match (&inputs.old_ddeb, &inputs.new_ddeb) {
        (Some(old), Some(new)) => {
            args.push("--debug-info-pkg1".to_string());
            args.push(old.display().to_string());
            args.push("--debug-info-pkg2".to_string());
            args.push(new.display().to_string());
        }
        _ => tracing::warn!("One or both of the -dbgsym.ddeb packages are missing, comparison may miss information"),
    }

    args.push(inputs.old_deb.display().to_string());
    args.push(inputs.new_deb.display().to_string());
    args
}

/// Run abipkgdiff and capture its exit bits and report
///
/// Termination by a signal is reported as the tool error bit.
pub fn run(inputs: &DiffInputs) -> Result<DiffOutcome, ProcessError> {
    let output = process::run(ABIPKGDIFF, &diff_args(inputs), None)?;
    Ok(DiffOutcome {
        exit_code: output.code.unwrap_or(1),
        output: output.stdout,
    })
}
