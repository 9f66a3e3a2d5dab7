//! Debian control file parsing
//!
//! Extracts the two things the build graph needs from `debian/control`:
//! the binary packages a source tree produces and the names of its
//! build-time dependencies.

use std::path::Path;

use crate::error::ControlError;
use crate::infra::filesystem;

/// Package names and build dependencies declared by one control file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlInfo {
    /// Binary packages, in declaration order, de-duplicated
    pub packages: Vec<String>,
    /// Build dependency names, in declaration order, de-duplicated
    pub build_depends: Vec<String>,
}

/// Parse control file content
///
/// The `Build-Depends:` field continues over indented lines until the
/// first line that is not indented. Each comma separated entry contributes
/// its first whitespace delimited token; version constraints, alternatives
/// and architecture qualifiers are dropped.
pub fn parse_control(content: &str) -> ControlInfo {
    let mut info = ControlInfo::default();
    let mut in_build_depends = false;
    let mut build_depends_lines: Vec<&str> = Vec::new();

    for line in content.lines() {
        if line.starts_with('#') {
            continue;
        }

        let indented = line.starts_with(' ') || line.starts_with('\t');
        if in_build_depends {
            if indented {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    build_depends_lines.push(trimmed);
                }
                continue;
            }
            in_build_depends = false;
        }

        if let Some(value) = line.strip_prefix("Package:") {
            push_unique(&mut info.packages, value.trim());
        } else if let Some(value) = line.strip_prefix("Build-Depends:") {
            in_build_depends = true;
            let value = value.trim();
            if !value.is_empty() {
                build_depends_lines.push(value);
            }
        }
    }

    let joined = build_depends_lines.join(" ");
    for entry in joined.split(',') {
        if let Some(name) = entry.split_whitespace().next() {
            push_unique(&mut info.build_depends, name);
        }
    }

    info
}

/// Read and parse a control file, rejecting descriptors without packages
pub fn parse_control_file(path: &Path) -> Result<ControlInfo, ControlError> {
    let content = filesystem::read_file(path).map_err(|e| ControlError::ReadError {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    let info = parse_control(&content);
    if info.packages.is_empty() {
        tracing::error!("Invalid control file at {}", path.display());
        return Err(ControlError::NoPackages {
            path: path.to_path_buf(),
        });
    }
    Ok(info)
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTROL: &str = "\
Source: libfoo
Section: libs
Build-Depends: debhelper-compat (= 13),
 libbar-dev (>= 1.2),
\tpkg-config,
 libbaz-dev [arm64] | libbaz-legacy-dev
Standards-Version: 4.6.2

Package: libfoo1
Architecture: any

Package: libfoo-dev
Architecture: any
Depends: libfoo1 (= ${binary:Version})
";

    #[test]
    fn test_parses_packages() {
        let info = parse_control(CONTROL);
        assert_eq!(info.packages, vec!["libfoo1", "libfoo-dev"]);
    }

    #[test]
    fn test_parses_multiline_build_depends() {
        let info = parse_control(CONTROL);
        assert_eq!(
            info.build_depends,
            vec!["debhelper-compat", "libbar-dev", "pkg-config", "libbaz-dev"]
        );
    }

    #[test]
    fn test_build_depends_stops_at_unindented_line() {
        let info = parse_control("Build-Depends: a\nPackage: p\n b\n");
        assert_eq!(info.build_depends, vec!["a"]);
        assert_eq!(info.packages, vec!["p"]);
    }

    #[test]
    fn test_empty_first_build_depends_line() {
        let info = parse_control("Package: p\nBuild-Depends:\n one,\n two (>= 2)\n");
        assert_eq!(info.build_depends, vec!["one", "two"]);
    }

    #[test]
    fn test_duplicate_dependencies_collapse() {
        let info = parse_control("Package: p\nBuild-Depends: a, a (>= 1), b\n");
        assert_eq!(info.build_depends, vec!["a", "b"]);
    }

    #[test]
    fn test_no_packages_is_rejected() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("control");
        std::fs::write(&path, "Source: broken\nBuild-Depends: a\n").unwrap();

        let result = parse_control_file(&path);
        assert!(matches!(result, Err(ControlError::NoPackages { .. })));
    }
}
