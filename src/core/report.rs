//! ABI check session records and the textual report

use std::fmt::{self, Write as _};
use std::path::Path;

use serde::Serialize;

use crate::core::abi::{AbiDiffStatus, AbiReturnCode, PolicyVerdict};
use crate::error::FilesystemError;
use crate::infra::filesystem;

const SEPARATOR_WIDTH: usize = 100;
const OUTPUT_INDENT: &str = "       ";

/// Artifact names and version for one side of a comparison
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageSide {
    /// Core `.deb` file name
    pub deb: Option<String>,
    /// `-dev.deb` file name
    pub dev: Option<String>,
    /// `-dbgsym.ddeb` file name
    pub ddeb: Option<String>,
    /// Version field of the core `.deb`
    pub version: Option<String>,
}

/// Missing auxiliary packages for a comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Remarks {
    /// A development package is missing on at least one side
    pub no_dev_package: bool,
    /// A debug symbol package is missing on at least one side
    pub no_dbg_package: bool,
}

impl Remarks {
    /// Whether there is anything to remark
    pub fn is_empty(&self) -> bool {
        !self.no_dev_package && !self.no_dbg_package
    }
}

impl fmt::Display for Remarks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.no_dev_package {
            parts.push("NO-DEV-PACKAGE");
        }
        if self.no_dbg_package {
            parts.push("NO-DBG-PACKAGE");
        }
        f.write_str(&parts.join(", "))
    }
}

/// Everything known about one package comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbiCheckRecord {
    /// Canonical package name
    pub package: String,
    /// Repository output folder the package came from
    pub repository: Option<String>,
    /// Freshly built artifacts
    pub new: PackageSide,
    /// Reference artifacts fetched from the remote repository
    pub old: PackageSide,
    /// Classification, once the diff tool ran
    pub status: Option<AbiDiffStatus>,
    /// Version policy verdict
    pub verdict: Option<PolicyVerdict>,
    /// Missing auxiliary packages
    pub remarks: Remarks,
    /// Why the reference packages could not be fetched
    pub fetch_failure: Option<String>,
    /// Full diff tool output when a difference was found
    pub output: Option<String>,
}

impl AbiCheckRecord {
    /// Start a record for a package
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            repository: None,
            new: PackageSide::default(),
            old: PackageSide::default(),
            status: None,
            verdict: None,
            remarks: Remarks::default(),
            fetch_failure: None,
            output: None,
        }
    }
}

/// A package whose comparison was aborted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbortedCheck {
    /// Package or repository that was being compared
    pub package: String,
    /// Why the comparison stopped
    pub reason: String,
}

/// Accumulated results of an ABI check run
#[derive(Debug, Clone, Default, Serialize)]
pub struct AbiSession {
    records: Vec<AbiCheckRecord>,
    aggregate: AbiReturnCode,
    aborted: Vec<AbortedCheck>,
}

impl AbiSession {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record, replacing an earlier one for the same package
    pub fn record(&mut self, record: AbiCheckRecord) {
        match self.records.iter_mut().find(|r| r.package == record.package) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    /// Fold an outcome into the aggregate bitmask
    pub fn merge(&mut self, code: AbiReturnCode) {
        self.aggregate |= code;
    }

    /// Remember a package whose comparison stopped early
    pub fn abort(&mut self, package: impl Into<String>, reason: impl Into<String>) {
        self.aborted.push(AbortedCheck {
            package: package.into(),
            reason: reason.into(),
        });
    }

    /// Records in processing order
    pub fn records(&self) -> &[AbiCheckRecord] {
        &self.records
    }

    /// Record for a package
    pub fn get(&self, package: &str) -> Option<&AbiCheckRecord> {
        self.records.iter().find(|r| r.package == package)
    }

    /// OR of all outcomes so far
    pub fn aggregate(&self) -> AbiReturnCode {
        self.aggregate
    }

    /// Aborted comparisons
    pub fn aborted(&self) -> &[AbortedCheck] {
        &self.aborted
    }

    /// Render the human readable report
    pub fn render_report(&self) -> String {
        let separator = "-".repeat(SEPARATOR_WIDTH);
        let mut log = String::from("ABI Check results\n\n");
        let _ = writeln!(log, "{separator}");

        for record in &self.records {
            render_record(&mut log, record);
            let _ = writeln!(log, "{separator}");
        }

        for aborted in &self.aborted {
            let _ = writeln!(log, "Aborted:          {}", aborted.package);
            let _ = writeln!(log, "  - Reason:       {}", aborted.reason);
            let _ = writeln!(log, "{separator}");
        }
        log
    }

    /// Write the report to `path`
    pub fn write_report(&self, path: &Path) -> Result<(), FilesystemError> {
        let report = self.render_report();
        tracing::debug!("{report}");
        filesystem::write_file(path, &report)
    }
}

fn or_none(value: Option<&str>) -> &str {
    value.unwrap_or("None")
}

fn render_side(log: &mut String, title: &str, side: &PackageSide) {
    let _ = writeln!(log, "{title}:");
    let _ = writeln!(log, "  - DEB Name:     {}", or_none(side.deb.as_deref()));
    let _ = writeln!(log, "  - DEV Name:     {}", or_none(side.dev.as_deref()));
    let _ = writeln!(log, "  - DDEB Name:    {}", or_none(side.ddeb.as_deref()));
    let _ = writeln!(log, "  - Version:      {}", or_none(side.version.as_deref()));
}

fn render_record(log: &mut String, record: &AbiCheckRecord) {
    let _ = writeln!(log, "Package Name:     {}", record.package);
    let _ = writeln!(log, "Repository Name:  {}", or_none(record.repository.as_deref()));
    render_side(log, "New Package", &record.new);
    render_side(log, "Old Package", &record.old);

    let status = record.status.map_or("None", AbiDiffStatus::label);
    let verdict = record
        .verdict
        .as_ref()
        .map_or_else(|| "None".to_string(), ToString::to_string);
    let mut remarks: Vec<String> = Vec::new();
    if !record.remarks.is_empty() {
        remarks.push(record.remarks.to_string());
    }
    remarks.extend(record.fetch_failure.clone());
    let remarks = if remarks.is_empty() {
        "None".to_string()
    } else {
        remarks.join(", ")
    };

    let _ = writeln!(log, "ABI Package Diff:");
    let _ = writeln!(log, "  - Result:       {status}");
    let _ = writeln!(log, "  - Version:      {verdict}");
    let _ = writeln!(log, "  - Remark:       {remarks}");
    match &record.output {
        Some(output) => {
            let _ = writeln!(log, "  - Output:");
            for line in output.lines() {
                let _ = writeln!(log, "{OUTPUT_INDENT}{line}");
            }
            log.push('\n');
        }
        None => {
            let _ = writeln!(log, "  - Output:       None");
        }
    }
}
