//! Tests for the ABI check pipeline over repository output folders
//!
//! The host tools are replaced by an in-memory toolchain serving reference
//! packages from a map.

mod common;

use std::collections::HashMap;
use std::path::Path;

use common::{diff_report, TestWorkspace};
use debforge::core::abi::{AbiDiffStatus, AbiReturnCode};
use debforge::core::checker::{AbiCheckOptions, AbiChecker, AbiToolchain, DiffInputs, DiffOutcome, ABI_TEMP_DIR};
use debforge::core::report::AbiSession;
use debforge::error::{AbiError, FetchError};
use predicates::prelude::*;

/// Serves reference packages by name and answers every diff the same way
struct FakeToolchain {
    remote: HashMap<String, String>,
    exit_code: i32,
    output: String,
    extracted: Vec<String>,
    diffs: Vec<DiffInputs>,
}

impl FakeToolchain {
    fn new(remote: &[(&str, &str)], exit_code: i32, output: &str) -> Self {
        Self {
            remote: remote.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect(),
            exit_code,
            output: output.to_string(),
            extracted: Vec::new(),
            diffs: Vec::new(),
        }
    }
}

impl AbiToolchain for FakeToolchain {
    fn extract(&mut self, package: &Path, _dest: &Path) -> Result<(), AbiError> {
        let name = package.file_name().unwrap().to_string_lossy().into_owned();
        self.extracted.push(name);
        Ok(())
    }

    fn update_index(&mut self, _download_dir: &Path, _apt_config: &str) -> Result<(), FetchError> {
        Ok(())
    }

    fn download(&mut self, download_dir: &Path, package: &str, version: Option<&str>) -> Result<(), FetchError> {
        let key = match version {
            Some(v) => format!("{package}={v}"),
            None => package.to_string(),
        };
        let file = self.remote.get(&key).ok_or_else(|| FetchError::Download {
            package: key.clone(),
            error: "E: Unable to locate package".to_string(),
        })?;
        std::fs::write(download_dir.join(file), b"").unwrap();
        Ok(())
    }

    fn diff(&mut self, inputs: &DiffInputs) -> Result<DiffOutcome, AbiError> {
        self.diffs.push(inputs.clone());
        Ok(DiffOutcome {
            exit_code: self.exit_code,
            output: self.output.clone(),
        })
    }
}

fn options(keep_temp: bool) -> AbiCheckOptions {
    AbiCheckOptions {
        apt_server_config: "deb [arch=arm64 trusted=yes] http://localhost noble/stable main".to_string(),
        old_version: None,
        keep_temp,
        non_reachable_types: true,
    }
}

/// Scenario F: no dev package on either side
#[test]
fn test_missing_dev_package_is_a_remark() {
    let ws = TestWorkspace::new();
    let repo = ws.add_packages(
        "out/libfoo",
        &["libfoo1_1.3.0-1_arm64.deb", "libfoo1-dbgsym_1.3.0-1_arm64.ddeb"],
    );
    let toolchain = FakeToolchain::new(
        &[
            ("libfoo1", "libfoo1_1.2.3-1_arm64.deb"),
            ("libfoo1-dbgsym", "libfoo1-dbgsym_1.2.3-1_arm64.ddeb"),
        ],
        0b0100,
        &diff_report(0, 0),
    );
    let mut checker = AbiChecker::new(toolchain, options(false));
    let mut session = AbiSession::new();

    let code = checker.check_repository(&repo, &mut session).unwrap();

    assert_eq!(code, AbiReturnCode::COMPATIBLE);
    let record = session.get("libfoo1").unwrap();
    assert_eq!(record.status, Some(AbiDiffStatus::Compatible));
    assert!(record.remarks.no_dev_package);
    assert!(!record.remarks.no_dbg_package);
    assert!(record.remarks.to_string().contains("NO-DEV-PACKAGE"));
    assert_eq!(record.verdict.as_ref().unwrap().to_string(), "PASS : Minor version increased");

    let extracted = &checker.toolchain().extracted;
    assert_eq!(extracted.len(), 4);
    assert!(extracted.contains(&"libfoo1_1.2.3-1_arm64.deb".to_string()));

    let inputs = &checker.toolchain().diffs[0];
    assert!(inputs.new_dev.is_none() && inputs.old_dev.is_none());
    assert!(inputs.new_ddeb.is_some() && inputs.old_ddeb.is_some());
}

#[test]
fn test_escalated_change_fails_minor_bump() {
    let ws = TestWorkspace::new();
    let repo = ws.add_packages("out/libfoo", &["libfoo1_1.3.0_arm64.deb"]);
    let toolchain = FakeToolchain::new(&[("libfoo1", "libfoo1_1.2.3_arm64.deb")], 0b0100, &diff_report(0, 2));
    let mut checker = AbiChecker::new(toolchain, options(false));
    let mut session = AbiSession::new();

    let code = checker.check_repository(&repo, &mut session).unwrap();

    assert_eq!(code, AbiReturnCode::INCOMPATIBLE);
    let record = session.get("libfoo1").unwrap();
    assert_eq!(
        record.verdict.as_ref().unwrap().to_string(),
        "FAIL : Minor version increased, needed major increase"
    );
    assert!(record.output.as_deref().unwrap().contains("2 Changed"));
}

#[test]
fn test_stripped_package_has_no_verdict() {
    let ws = TestWorkspace::new();
    let repo = ws.add_packages("out/libfoo", &["libfoo1_1.3.0_arm64.deb"]);
    let toolchain = FakeToolchain::new(&[("libfoo1", "libfoo1_1.2.3_arm64.deb")], 0b0010, "");
    let mut checker = AbiChecker::new(toolchain, options(false));
    let mut session = AbiSession::new();

    let code = checker.check_repository(&repo, &mut session).unwrap();

    assert_eq!(code, AbiReturnCode::STRIPPED);
    let record = session.get("libfoo1").unwrap();
    assert_eq!(record.status, Some(AbiDiffStatus::Stripped));
    assert!(record.verdict.is_none());
}

#[test]
fn test_pinned_old_version_is_downloaded() {
    let ws = TestWorkspace::new();
    let repo = ws.add_packages("out/libfoo", &["libfoo1_2.0.0_arm64.deb"]);
    let toolchain = FakeToolchain::new(&[("libfoo1=1.0.0", "libfoo1_1.0.0_arm64.deb")], 0b1100, "");
    let mut options = options(false);
    options.old_version = Some("1.0.0".to_string());
    let mut checker = AbiChecker::new(toolchain, options);
    let mut session = AbiSession::new();

    let code = checker.check_repository(&repo, &mut session).unwrap();

    assert_eq!(code, AbiReturnCode::INCOMPATIBLE);
    let record = session.get("libfoo1").unwrap();
    assert_eq!(record.old.version.as_deref(), Some("1.0.0"));
    assert!(record.verdict.as_ref().unwrap().passed);
}

#[test]
fn test_malformed_new_version_is_fatal() {
    let ws = TestWorkspace::new();
    let repo = ws.add_packages("out/libfoo", &["libfoo1_1.3_arm64.deb"]);
    let toolchain = FakeToolchain::new(&[("libfoo1", "libfoo1_1.2.3_arm64.deb")], 0, "");
    let mut checker = AbiChecker::new(toolchain, options(false));
    let mut session = AbiSession::new();

    let result = checker.check_repository(&repo, &mut session);
    assert!(matches!(result, Err(AbiError::Version(_))));
}

#[test]
fn test_multi_repository_results_are_combined() {
    let ws = TestWorkspace::new();
    ws.add_packages("out/libfoo", &["libfoo1_1.3.0_arm64.deb"]);
    ws.add_packages("out/libbar", &["libbar2_1.0.1_arm64.deb"]);
    ws.add_packages("out/docs", &["README"]);
    let toolchain = FakeToolchain::new(
        &[
            ("libfoo1", "libfoo1_1.2.3_arm64.deb"),
            ("libbar2", "libbar2_1.0.0_arm64.deb"),
        ],
        0b0100,
        "",
    );
    let mut checker = AbiChecker::new(toolchain, options(true));
    let mut session = AbiSession::new();

    let code = checker.check_repositories(&ws.path().join("out"), &mut session).unwrap();

    assert_eq!(code, AbiReturnCode::COMPATIBLE);
    assert_eq!(session.aggregate(), code);
    assert_eq!(session.records().len(), 2);
    assert!(!session.get("libbar2").unwrap().verdict.as_ref().unwrap().passed);
    assert_eq!(
        session.get("libbar2").unwrap().repository.as_deref(),
        Some("libbar")
    );
    assert!(ws.path().join("out/libfoo").join(ABI_TEMP_DIR).is_dir());
}

#[test]
fn test_report_lists_every_package() {
    let ws = TestWorkspace::new();
    let repo = ws.add_packages(
        "out/libfoo",
        &["libfoo1_1.3.0_arm64.deb", "libfoo-dev_1.3.0_arm64.deb"],
    );
    let toolchain = FakeToolchain::new(
        &[
            ("libfoo1", "libfoo1_1.2.3_arm64.deb"),
            ("libfoo-dev", "libfoo-dev_1.2.3_arm64.deb"),
        ],
        0b0100,
        &diff_report(0, 0),
    );
    let mut checker = AbiChecker::new(toolchain, options(false));
    let mut session = AbiSession::new();
    checker.check_repository(&repo, &mut session).unwrap();

    let report_file = ws.path().join("abi_checker.log");
    session.write_report(&report_file).unwrap();

    let report = std::fs::read_to_string(&report_file).unwrap();
    assert!(predicate::str::contains("libfoo1_1.3.0_arm64.deb").eval(&report));
    assert!(predicate::str::contains("libfoo-dev_1.2.3_arm64.deb").eval(&report));
    assert!(predicate::str::contains("COMPATIBLE-DIFF").eval(&report));
    assert!(predicate::str::contains("PASS : Minor version increased").eval(&report));
    assert!(predicate::str::contains("NO-DBG-PACKAGE").eval(&report));
    assert!(predicate::str::contains("Functions changes summary").eval(&report));
}
