//! Debian artifact filename conventions
//!
//! `name_version_arch.deb`, `name-dev_version_arch.deb`,
//! `name-dbgsym_version_arch.ddeb` and `name_version.dsc`. The canonical
//! package name is everything before the first `_`.

use std::fmt;

use crate::error::ArtifactError;

/// Suffix marking a development package
pub const DEV_SUFFIX: &str = "-dev";

/// Suffix marking a debug symbol package
pub const DBGSYM_SUFFIX: &str = "-dbgsym";

/// Kind of a Debian artifact, derived from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Binary package (`.deb`)
    Deb,
    /// Debug symbol package (`.ddeb`)
    Ddeb,
    /// Source package description (`.dsc`)
    Dsc,
}

impl ArtifactKind {
    /// File extension without the dot
    pub fn extension(self) -> &'static str {
        match self {
            Self::Deb => "deb",
            Self::Ddeb => "ddeb",
            Self::Dsc => "dsc",
        }
    }

    /// Detect the kind from a file name
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        [Self::Deb, Self::Ddeb, Self::Dsc]
            .into_iter()
            .find(|kind| file_name.ends_with(&format!(".{}", kind.extension())))
    }
}

/// A parsed artifact file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebArtifact {
    /// Full file name
    pub file_name: String,
    /// Package name (text before the first `_`)
    pub name: String,
    /// Version field
    pub version: String,
    /// Architecture field, absent for `.dsc`
    pub arch: Option<String>,
    /// Artifact kind
    pub kind: ArtifactKind,
}

impl DebArtifact {
    /// Parse `name_version[_arch].ext`
    pub fn parse(file_name: &str) -> Result<Self, ArtifactError> {
        let invalid = |extension: &str| ArtifactError::InvalidFileName {
            file: file_name.to_string(),
            extension: extension.to_string(),
        };

        let kind = ArtifactKind::from_file_name(file_name).ok_or_else(|| invalid("deb"))?;
        let stem = &file_name[..file_name.len() - kind.extension().len() - 1];

        let mut fields = stem.split('_');
        let name = fields.next().filter(|s| !s.is_empty());
        let version = fields.next().filter(|s| !s.is_empty());
        let arch = fields.next().map(ToString::to_string);

        match (name, version) {
            (Some(name), Some(version)) => Ok(Self {
                file_name: file_name.to_string(),
                name: name.to_string(),
                version: version.to_string(),
                arch,
                kind,
            }),
            _ => Err(invalid(kind.extension())),
        }
    }

    /// Whether this is a development package
    pub fn is_dev(&self) -> bool {
        self.name.contains(DEV_SUFFIX)
    }

    /// Whether this is a debug symbol package
    pub fn is_debug(&self) -> bool {
        self.kind == ArtifactKind::Ddeb || self.name.contains(DBGSYM_SUFFIX)
    }
}

impl fmt::Display for DebArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name)
    }
}

/// Canonical package name of an artifact file: text before the first `_`
pub fn canonical_name(file_name: &str) -> &str {
    file_name.split('_').next().unwrap_or(file_name)
}

/// Strip a trailing SOVERSION digit (`libfoo1` -> `libfoo`)
///
/// Development packages carry the library name without the SOVERSION.
pub fn strip_soversion(package_name: &str) -> &str {
    match package_name.char_indices().last() {
        Some((idx, c)) if c.is_ascii_digit() => &package_name[..idx],
        _ => package_name,
    }
}

/// Whether a file is a core binary package (neither dev nor dbgsym)
pub fn is_core_deb(file_name: &str) -> bool {
    file_name.ends_with(".deb") && !file_name.contains(DEV_SUFFIX) && !file_name.contains(DBGSYM_SUFFIX)
}

/// Find the development package matching `package_name` among `files`
///
/// Candidates are `.deb` files containing both the SOVERSION-less name and
/// `-dev`. Several candidates are narrowed to those containing
/// `<name>-dev`; more than one left is ambiguous.
pub fn find_dev_package(files: &[String], package_name: &str) -> Result<Option<String>, ArtifactError> {
    let base = strip_soversion(package_name);
    let candidates: Vec<&String> = files
        .iter()
        .filter(|f| f.ends_with(".deb") && f.contains(base) && f.contains(DEV_SUFFIX))
        .collect();

    match candidates.as_slice() {
        [] => Ok(None),
        [only] => Ok(Some((*only).clone())),
        _ => {
            let exact = format!("{base}{DEV_SUFFIX}");
            let narrowed: Vec<&String> = candidates.iter().copied().filter(|f| f.contains(&exact)).collect();
            match narrowed.as_slice() {
                [only] => Ok(Some((*only).clone())),
                _ => Err(ArtifactError::MultipleCandidates {
                    package: package_name.to_string(),
                    kind: "-dev.deb".to_string(),
                    candidates: candidates.into_iter().cloned().collect(),
                }),
            }
        }
    }
}

/// Find the debug symbol package matching `package_name` among `files`
pub fn find_debug_package(files: &[String], package_name: &str) -> Result<Option<String>, ArtifactError> {
    let marker = format!("{package_name}{DBGSYM_SUFFIX}");
    let candidates: Vec<&String> = files
        .iter()
        .filter(|f| f.ends_with(".ddeb") && f.contains(&marker))
        .collect();

    match candidates.as_slice() {
        [] => Ok(None),
        [only] => Ok(Some((*only).clone())),
        _ => Err(ArtifactError::MultipleCandidates {
            package: package_name.to_string(),
            kind: "-dbgsym.ddeb".to_string(),
            candidates: candidates.into_iter().cloned().collect(),
        }),
    }
}
