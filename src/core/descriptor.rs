//! Package descriptors discovered in a source tree
//!
//! One descriptor per `debian/control` found under the source root.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::core::control::{self, ControlInfo};
use crate::core::resolver::DependencyGraph;
use crate::error::ControlError;

/// Directory name holding Debian packaging metadata
pub const DEBIAN_DIR: &str = "debian";

/// One buildable source tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    /// Unique key: the `debian/` directory of the source tree
    pub key: PathBuf,
    /// Root of the source tree (parent of `debian/`)
    pub repo_path: PathBuf,
    /// Binary packages produced, never empty
    pub packages: Vec<String>,
    /// Build dependency names
    pub dependencies: Vec<String>,
    /// Set once the build for this descriptor has been dispatched
    pub visited: bool,
}

impl PackageDescriptor {
    /// Create a descriptor from parsed control information
    pub fn new(repo_path: impl Into<PathBuf>, info: ControlInfo) -> Self {
        let repo_path = repo_path.into();
        Self {
            key: repo_path.join(DEBIAN_DIR),
            repo_path,
            packages: info.packages,
            dependencies: info.build_depends,
            visited: false,
        }
    }

    /// Whether this descriptor produces the given binary package
    pub fn produces(&self, package: &str) -> bool {
        self.packages.iter().any(|p| p == package)
    }
}

/// All descriptors loaded for one session, keyed by descriptor key
///
/// Iteration follows discovery order: the order descriptors were first
/// inserted.
#[derive(Debug, Clone, Default)]
pub struct DescriptorTable {
    descriptors: HashMap<PathBuf, PackageDescriptor>,
    order: Vec<PathBuf>,
}

impl DescriptorTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `root` recursively for `debian/control` files
    ///
    /// Directories are walked depth first with entries sorted by name, so
    /// discovery order is stable across hosts. `.git` directories are not
    /// descended into. A control file declaring no packages aborts the
    /// whole load.
    pub fn load(root: &Path) -> Result<Self, ControlError> {
        let mut table = Self::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.file_name() != ".git");

        for entry in walker {
            let entry = entry.map_err(|e| ControlError::ScanError {
                path: root.to_path_buf(),
                error: e.to_string(),
            })?;
            if !entry.file_type().is_dir() || entry.file_name() == DEBIAN_DIR {
                continue;
            }

            let control_file = entry.path().join(DEBIAN_DIR).join("control");
            if !control_file.is_file() {
                continue;
            }

            let info = control::parse_control_file(&control_file)?;
            tracing::debug!(
                "Loaded {} (packages: {:?}, build-depends: {:?})",
                control_file.display(),
                info.packages,
                info.build_depends
            );
            table.insert(PackageDescriptor::new(entry.path(), info));
        }

        tracing::info!("Loaded {} package descriptors from {}", table.len(), root.display());
        Ok(table)
    }

    /// Add a descriptor, or replace one with the same key in place
    pub fn insert(&mut self, descriptor: PackageDescriptor) {
        let key = descriptor.key.clone();
        if self.descriptors.insert(key.clone(), descriptor).is_none() {
            self.order.push(key);
        }
    }

    /// Look up a descriptor by key
    pub fn get(&self, key: &Path) -> Option<&PackageDescriptor> {
        self.descriptors.get(key)
    }

    /// Iterate descriptors in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &PackageDescriptor> {
        self.order.iter().filter_map(|key| self.descriptors.get(key))
    }

    /// Number of descriptors
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether no descriptors were loaded
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Keys of all descriptors producing `package`, visited or not
    pub fn producers(&self, package: &str) -> Vec<PathBuf> {
        self.iter()
            .filter(|d| d.produces(package))
            .map(|d| d.key.clone())
            .collect()
    }

    /// Key of the first unvisited descriptor producing `package`
    pub fn first_unvisited_producer(&self, package: &str) -> Option<PathBuf> {
        self.iter()
            .find(|d| !d.visited && d.produces(package))
            .map(|d| d.key.clone())
    }

    /// Mark a descriptor as built
    pub fn mark_visited(&mut self, key: &Path) {
        if let Some(descriptor) = self.descriptors.get_mut(key) {
            descriptor.visited = true;
        }
    }

    /// Build the dependency graph induced by all descriptors
    pub fn graph(&self) -> DependencyGraph {
        DependencyGraph::from_descriptors(self.iter())
    }
}
