//! External process execution
//!
//! Every tool debforge drives (sbuild, dpkg, apt-get, abipkgdiff) runs
//! through here: blocking, with captured stdout/stderr and exit code.

use std::path::Path;
use std::process::Command;

use crate::error::ProcessError;

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the process exited with code 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Standard output followed by standard error
    pub fn combined(&self) -> String {
        let mut out = self.stdout.trim_end().to_string();
        let err = self.stderr.trim_end();
        if !err.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(err);
        }
        out
    }
}

/// Render a program and its arguments for log output
pub fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run a command to completion and capture its output
///
/// A non-zero exit is not an error here; callers decide what it means.
pub fn run(program: &str, args: &[String], cwd: Option<&Path>) -> Result<CommandOutput, ProcessError> {
    let rendered = display_command(program, args);
    tracing::debug!("Running command: {rendered}");

    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let output = command.output().map_err(|e| ProcessError::Spawn {
        command: rendered.clone(),
        error: e.to_string(),
    })?;

    let result = CommandOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    let stderr = result.stderr.trim();
    if !stderr.is_empty() {
        if result.success() {
            tracing::debug!("Successful return value, yet there is content in stderr: {stderr}");
        } else {
            tracing::error!("{rendered} exited with {:?}: {stderr}", result.code);
        }
    }

    Ok(result)
}

/// Run a command and turn a non-zero exit into [`ProcessError::Failed`]
pub fn run_checked(
    program: &str,
    args: &[String],
    cwd: Option<&Path>,
) -> Result<CommandOutput, ProcessError> {
    let output = run(program, args, cwd)?;
    if output.success() {
        Ok(output)
    } else {
        Err(ProcessError::Failed {
            command: display_command(program, args),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        })
    }
}
