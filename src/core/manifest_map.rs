//! Open/proprietary classification of source trees
//!
//! `manifest_map.txt` maps workspace-relative project paths to a category:
//!
//! ```text
//! sources/vendor/libfoo	prop
//! sources/oss/libbar	oss
//! ```

use std::path::Path;

use crate::error::ConfigError;
use crate::infra::filesystem;

/// Category for open source packages, also the fallback
pub const CATEGORY_OSS: &str = "oss";

/// Category for proprietary packages
pub const CATEGORY_PROP: &str = "prop";

/// Prefix that replaces the source root in looked up paths
const SOURCES_PREFIX: &str = "sources";

/// Decides the output category of a source tree's artifacts
pub trait ArtifactClassifier {
    /// Category directory name for artifacts built from `repo_path`
    fn classify(&self, repo_path: &Path) -> String;
}

/// Classifier that puts everything in one category
#[derive(Debug, Clone)]
pub struct FixedCategory(pub String);

impl Default for FixedCategory {
    fn default() -> Self {
        Self(CATEGORY_OSS.to_string())
    }
}

impl ArtifactClassifier for FixedCategory {
    fn classify(&self, _repo_path: &Path) -> String {
        self.0.clone()
    }
}

/// Parsed manifest map
#[derive(Debug, Clone, Default)]
pub struct ManifestMap {
    source_root: String,
    /// Entries in file order
    entries: Vec<(String, String)>,
}

impl ManifestMap {
    /// Parse tab separated `path<TAB>category` lines
    ///
    /// Lines without a tab are ignored.
    pub fn parse(content: &str, source_root: &Path) -> Self {
        let entries = content
            .lines()
            .filter_map(|line| {
                let (path, category) = line.trim().split_once('\t')?;
                Some((path.trim().to_string(), category.trim().to_string()))
            })
            .collect();

        Self {
            source_root: source_root.to_string_lossy().into_owned(),
            entries,
        }
    }

    /// Load a manifest map file
    pub fn load(path: &Path, source_root: &Path) -> Result<Self, ConfigError> {
        let content = filesystem::read_file(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        let map = Self::parse(&content, source_root);
        tracing::debug!("Loaded {} manifest map entries from {}", map.len(), path.display());
        Ok(map)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the category of a path
    ///
    /// The source root prefix is replaced with `sources`. An exact key match
    /// wins; otherwise the first key whose components all appear in the
    /// path is used.
    pub fn lookup(&self, path: &Path) -> Option<&str> {
        let path = path.to_string_lossy();
        let path = path.trim();
        let relative = if self.source_root.is_empty() {
            path.to_string()
        } else {
            path.replacen(&self.source_root, SOURCES_PREFIX, 1)
        };

        if let Some((_, category)) = self.entries.iter().find(|(key, _)| *key == relative) {
            return Some(category);
        }

        let components: Vec<&str> = relative.split('/').collect();
        self.entries
            .iter()
            .find(|(key, _)| key.split('/').all(|part| components.contains(&part)))
            .map(|(_, category)| category.as_str())
    }
}

impl ArtifactClassifier for ManifestMap {
    fn classify(&self, repo_path: &Path) -> String {
        self.lookup(repo_path).unwrap_or(CATEGORY_OSS).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = "sources/vendor/libfoo\tprop\nsources/oss/libbar\toss\nbroken line\n";

    #[test]
    fn test_exact_match() {
        let map = ManifestMap::parse(MAP, Path::new("/ws/sources"));
        assert_eq!(map.len(), 2);
        assert_eq!(map.lookup(Path::new("/ws/sources/vendor/libfoo")), Some("prop"));
    }

    #[test]
    fn test_component_subset_match() {
        let map = ManifestMap::parse(MAP, Path::new("/ws/sources"));
        assert_eq!(
            map.lookup(Path::new("/ws/sources/vendor/group/libfoo")),
            Some("prop")
        );
    }

    #[test]
    fn test_unknown_path_falls_back_to_oss() {
        let map = ManifestMap::parse(MAP, Path::new("/ws/sources"));
        assert_eq!(map.lookup(Path::new("/ws/sources/other")), None);
        assert_eq!(map.classify(Path::new("/ws/sources/other")), CATEGORY_OSS);
        assert_eq!(FixedCategory::default().classify(Path::new("/x")), CATEGORY_OSS);
    }
}
