//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Test workspace context
///
/// Creates a temporary directory laid out like a debforge workspace and
/// provides helpers for writing source trees and package files.
pub struct TestWorkspace {
    /// Temporary directory for the workspace
    pub dir: TempDir,
}

impl TestWorkspace {
    /// Create a new workspace in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the workspace directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// The `sources/` directory
    pub fn sources(&self) -> PathBuf {
        self.dir.path().join("sources")
    }

    /// Create a file in the workspace
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the workspace
    pub fn create_dir(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(&path).expect("Failed to create directory");
        path
    }

    /// Write `sources/<tree>/debian/control`
    pub fn add_source(&self, tree: &str, packages: &[&str], build_depends: &[&str]) -> PathBuf {
        self.create_file(
            &format!("sources/{tree}/debian/control"),
            &control_file(tree, packages, build_depends),
        );
        self.sources().join(tree)
    }

    /// Create empty package files in a directory
    pub fn add_packages(&self, dir: &str, files: &[&str]) -> PathBuf {
        let dir = self.create_dir(dir);
        touch_all(&dir, files);
        dir
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a minimal `debian/control`
pub fn control_file(source: &str, packages: &[&str], build_depends: &[&str]) -> String {
    let mut content = format!("Source: {source}\nSection: libs\nPriority: optional\n");
    if !build_depends.is_empty() {
        content.push_str("Build-Depends: debhelper-compat (= 13)");
        for dep in build_depends {
            content.push_str(&format!(",\n {dep}"));
        }
        content.push('\n');
    }
    content.push_str("Standards-Version: 4.6.2\n");
    for package in packages {
        content.push_str(&format!("\nPackage: {package}\nArchitecture: any\nDescription: {package}\n"));
    }
    content
}

/// Create empty files
pub fn touch_all(dir: &Path, files: &[&str]) {
    for file in files {
        std::fs::write(dir.join(file), b"").expect("Failed to write file");
    }
}

/// Sample abipkgdiff report with a functions summary
pub fn diff_report(removed: u32, changed: u32) -> String {
    format!(
        "================ changes of 'libfoo.so.1'===============\n  \
         Functions changes summary: {removed} Removed, {changed} Changed, 0 Added function\n  \
         Variables changes summary: 0 Removed, 0 Changed, 0 Added variable\n"
    )
}
