//! Upstream version parsing and bump detection
//!
//! Debian versions carry a distro revision (`1.2.3-1`, `1.2.3+git20240101`,
//! `1.2.3~rc1`). Only the upstream `major.minor.patch` part matters for ABI
//! policy, so it is reduced to a [`semver::Version`] before comparing.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use semver::Version;

use crate::error::VersionError;

/// Which side of a comparison a version string belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSide {
    /// Previously published package
    Old,
    /// Freshly built package
    New,
}

impl fmt::Display for VersionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Old => f.write_str("old"),
            Self::New => f.write_str("new"),
        }
    }
}

/// Strongest component that strictly increased between two versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionBump {
    /// Major component increased
    Major,
    /// Minor component increased
    Minor,
    /// Patch component increased
    Patch,
    /// No component increased
    None,
}

impl fmt::Display for VersionBump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major => f.write_str("Major"),
            Self::Minor => f.write_str("Minor"),
            Self::Patch => f.write_str("Patch"),
            Self::None => f.write_str("No"),
        }
    }
}

fn upstream_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\.(\d+)\.(\d+)").expect("valid upstream pattern"))
}

fn valid_upstream() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\d+\.\d+(-\d+)?$").expect("valid version pattern"))
}

/// Reduce a Debian version to its upstream `major.minor.patch` prefix
///
/// Returns the input unchanged when it does not start with three numeric
/// components, so validation can report the original string.
pub fn extract_upstream_version(version: &str) -> &str {
    upstream_prefix()
        .find(version)
        .map_or(version, |m| m.as_str())
}

/// Parse the upstream part of `version` for the given side
pub fn parse_upstream(version: &str, side: VersionSide) -> Result<Version, VersionError> {
    let invalid = || VersionError::InvalidVersion {
        side: side.to_string(),
        version: version.to_string(),
    };

    let upstream = extract_upstream_version(version);
    if !valid_upstream().is_match(upstream) {
        return Err(invalid());
    }

    let caps = upstream_prefix().captures(upstream).ok_or_else(invalid)?;
    let component = |i: usize| -> Result<u64, VersionError> {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .ok_or_else(invalid)
    };
    Ok(Version::new(component(1)?, component(2)?, component(3)?))
}

/// Determine the strongest strictly increased component
///
/// Components are compared independently, so `2.0.0 -> 1.5.0` reports a
/// minor bump.
pub fn detect_bump(old: &Version, new: &Version) -> VersionBump {
    if new.major > old.major {
        VersionBump::Major
    } else if new.minor > old.minor {
        VersionBump::Minor
    } else if new.patch > old.patch {
        VersionBump::Patch
    } else {
        VersionBump::None
    }
}

/// Parse both sides and detect the bump between them
pub fn compare_versions(old: &str, new: &str) -> Result<VersionBump, VersionError> {
    let old = parse_upstream(old, VersionSide::Old)?;
    let new = parse_upstream(new, VersionSide::New)?;
    Ok(detect_bump(&old, &new))
}
