//! Doctor command logic
//!
//! Checks that the Debian packaging tools are installed and reports issues
//! with suggestions.

use std::path::{Path, PathBuf};

use crate::config::{self, DebforgeConfig};

/// Result of a single dependency check
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the dependency being checked
    pub name: String,
    /// Whether the check passed
    pub passed: bool,
    /// Resolved location on `PATH`
    pub path: Option<PathBuf>,
    /// Error message if check failed
    pub error: Option<String>,
    /// Suggestion for fixing the issue
    pub suggestion: Option<String>,
    /// Whether this is a required or optional dependency
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result
    pub fn pass(name: &str, path: Option<PathBuf>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            path,
            error: None,
            suggestion: None,
            required,
        }
    }

    /// Create a failing check result
    pub fn fail(name: &str, error: &str, suggestion: Option<&str>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            path: None,
            error: Some(error.to_string()),
            suggestion: suggestion.map(String::from),
            required,
        }
    }
}

/// Overall doctor report
#[derive(Debug, Default)]
pub struct DoctorReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,
    /// Configuration issues found
    pub config_issues: Vec<String>,
}

impl DoctorReport {
    /// Create a new empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a check result
    pub fn add_check(&mut self, result: CheckResult) {
        self.checks.push(result);
    }

    /// Add a configuration issue
    pub fn add_config_issue(&mut self, issue: String) {
        self.config_issues.push(issue);
    }

    /// Check if all required checks passed
    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    /// Check if all checks passed (including optional)
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed) && self.config_issues.is_empty()
    }

    /// Count passed checks
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Count failed checks
    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    /// Get all failed required checks
    pub fn failed_required(&self) -> Vec<&CheckResult> {
        self.checks.iter().filter(|c| c.required && !c.passed).collect()
    }
}

/// A tool debforge shells out to
#[derive(Debug, Clone, Copy)]
pub struct ToolRequirement {
    /// Executable name
    pub command: &'static str,
    /// Debian package providing it
    pub package: &'static str,
    /// Needed by the build path rather than only by `abi-check`
    pub required: bool,
}

/// Every external tool used by the build and ABI check paths
pub const TOOLS: &[ToolRequirement] = &[
    ToolRequirement { command: "sbuild", package: "sbuild", required: true },
    ToolRequirement { command: "sbuild-createchroot", package: "sbuild", required: true },
    ToolRequirement { command: "dpkg", package: "dpkg", required: true },
    ToolRequirement { command: "dpkg-scanpackages", package: "dpkg-dev", required: true },
    ToolRequirement { command: "gzip", package: "gzip", required: true },
    ToolRequirement { command: "apt-get", package: "apt", required: false },
    ToolRequirement { command: "abipkgdiff", package: "abigail-tools", required: false },
];

/// Check that a tool is on `PATH`
pub fn check_tool(tool: &ToolRequirement) -> CheckResult {
    match which::which(tool.command) {
        Ok(path) => CheckResult::pass(tool.command, Some(path), tool.required),
        Err(_) => {
            let suggestion = format!("Install it with 'sudo apt-get install {}'", tool.package);
            CheckResult::fail(
                tool.command,
                &format!("{} not found in PATH", tool.command),
                Some(&suggestion),
                tool.required,
            )
        }
    }
}

/// Check the workspace configuration and layout
pub fn check_workspace(workspace: &Path) -> Vec<String> {
    let mut issues = Vec::new();

    let config_path = workspace.join(config::CONFIG_FILE_NAME);
    if config_path.exists() {
        if let Err(e) = DebforgeConfig::load_file(&config_path) {
            issues.push(e.to_string());
        }
    }

    let sources = workspace.join(config::defaults::SOURCES_DIR);
    if !sources.is_dir() {
        issues.push(format!("Source directory '{}' does not exist", sources.display()));
    }

    issues
}

/// Run all doctor checks
pub fn run_doctor(workspace: Option<&Path>) -> DoctorReport {
    let mut report = DoctorReport::new();

    for tool in TOOLS {
        report.add_check(check_tool(tool));
    }

    if let Some(dir) = workspace {
        for issue in check_workspace(dir) {
            report.add_config_issue(issue);
        }
    }

    report
}
