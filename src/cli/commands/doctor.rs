//! CLI command for `debforge doctor`
//!
//! Checks that the packaging tools are installed and reports issues with
//! suggestions.

use std::path::Path;

use anyhow::Result;

use crate::cli::output::{is_json, is_quiet, print_detail, print_info, print_success, print_warning, status};
use crate::core::doctor::run_doctor;

/// Execute the doctor command
pub fn execute(workspace: Option<&Path>) -> Result<i32> {
    let report = run_doctor(workspace);

    if is_json() {
        let json_result = serde_json::json!({
            "status": if report.all_passed() { "success" } else if report.failed_required().is_empty() { "warning" } else { "error" },
            "checks": report.checks.iter().map(|c| serde_json::json!({
                "name": c.name,
                "passed": c.passed,
                "required": c.required,
                "path": c.path,
                "error": c.error,
                "suggestion": c.suggestion
            })).collect::<Vec<_>>(),
            "config_issues": report.config_issues,
            "passed_count": report.passed_count(),
            "total_count": report.checks.len()
        });
        println!("{}", serde_json::to_string_pretty(&json_result)?);

        if !report.failed_required().is_empty() {
            return Err(anyhow::anyhow!("Missing required dependencies"));
        }
        return Ok(0);
    }

    if is_quiet() {
        let failed_required = report.failed_required();
        if !failed_required.is_empty() {
            for check in failed_required {
                eprintln!("{} Missing required: {}", status::ERROR, check.name);
            }
            return Err(anyhow::anyhow!("Missing required dependencies"));
        }
        return Ok(0);
    }

    print_info("Checking system dependencies...");
    println!();

    for check in &report.checks {
        let required_str = if check.required { "" } else { " [optional]" };

        if check.passed {
            let location = check
                .path
                .as_ref()
                .map(|p| format!(" ({})", p.display()))
                .unwrap_or_default();
            println!("  {} {}{location}{required_str}", status::SUCCESS, check.name);
        } else {
            println!("  {} {}{required_str}", status::ERROR, check.name);
            if let Some(error) = &check.error {
                print_detail(&format!("Error: {error}"));
            }
            if let Some(suggestion) = &check.suggestion {
                print_detail(&format!("Suggestion: {suggestion}"));
            }
        }
    }

    if !report.config_issues.is_empty() {
        println!();
        print_warning("Workspace issues:");
        for issue in &report.config_issues {
            print_detail(&format!("• {issue}"));
        }
    }

    println!();
    let passed = report.passed_count();
    let total = report.checks.len();
    let failed_required = report.failed_required();

    if report.all_passed() {
        print_success(&format!("All checks passed ({passed}/{total})"));
    } else if failed_required.is_empty() {
        print_warning(&format!("{passed}/{total} checks passed (optional tools missing)"));
        print_detail("Builds will work; ABI checks need the missing tools.");
    } else {
        println!("{} {passed}/{total} checks passed", status::ERROR);
        print_detail("Please install missing required tools:");
        for check in &failed_required {
            if let Some(suggestion) = &check.suggestion {
                print_detail(&format!("• {}: {suggestion}", check.name));
            }
        }
        return Err(anyhow::anyhow!(
            "Missing required dependencies. Run 'debforge doctor' for details."
        ));
    }

    Ok(0)
}
