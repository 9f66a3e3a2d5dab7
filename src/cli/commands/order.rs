//! CLI command for `debforge order`
//!
//! Loads every descriptor below a source directory and prints the order
//! `debforge build` would use.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::{is_json, is_quiet, print_detail, print_info};
use crate::core::descriptor::DescriptorTable;
use crate::error::DebforgeError;

/// Execute the order command
pub fn execute(sources: &Path) -> Result<i32> {
    if !sources.is_dir() {
        return Err(DebforgeError::SourcesNotFound {
            path: sources.to_path_buf(),
        }
        .into());
    }
    let table = DescriptorTable::load(sources)
        .with_context(|| format!("Failed to load source tree {}", sources.display()))?;
    let order = table.graph().topological_sort()?;

    if is_json() {
        let local: Vec<&str> = order
            .order
            .iter()
            .filter(|p| !table.producers(p).is_empty())
            .map(String::as_str)
            .collect();
        let json = serde_json::json!({
            "order": order.order,
            "local": local,
            "descriptors": table.len(),
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(0);
    }

    if is_quiet() {
        for package in &order.order {
            println!("{package}");
        }
        return Ok(0);
    }

    print_info(&format!(
        "{} source trees, {} packages in build order:",
        table.len(),
        order.order.len()
    ));
    for (index, package) in order.order.iter().enumerate() {
        let origin = if table.producers(package).is_empty() { " [external]" } else { "" };
        print_detail(&format!("{:>3}. {package}{origin}", index + 1));
    }
    Ok(0)
}
