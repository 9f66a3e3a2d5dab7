//! Build orchestration logic
//!
//! Coordinates the build process across multiple source packages: either
//! everything in dependency order, or one package after its transitive
//! build dependencies.

use std::path::{Path, PathBuf};

use crate::core::descriptor::{DescriptorTable, PackageDescriptor};
use crate::core::resolver::BuildOrder;
use crate::error::{BuildError, ResolverError};

/// Builds a single source package
///
/// Implemented by the sbuild driver in [`crate::infra::sbuild`]; tests use
/// in-memory recorders.
pub trait PackageBuild {
    /// Build one descriptor's source tree
    fn build(&mut self, descriptor: &PackageDescriptor) -> Result<(), BuildError>;
}

impl<B: PackageBuild + ?Sized> PackageBuild for &mut B {
    fn build(&mut self, descriptor: &PackageDescriptor) -> Result<(), BuildError> {
        (**self).build(descriptor)
    }
}

/// Build orchestrator state
#[derive(Debug)]
pub struct BuildOrchestrator<B> {
    /// Descriptors with their visited flags
    table: DescriptorTable,
    /// Single-package build operation
    builder: B,
    /// Keys of descriptors built so far, in build order
    built: Vec<PathBuf>,
}

impl<B: PackageBuild> BuildOrchestrator<B> {
    /// Create a new build orchestrator
    pub fn new(table: DescriptorTable, builder: B) -> Self {
        Self {
            table,
            builder,
            built: Vec::new(),
        }
    }

    /// Get the descriptor table
    pub fn table(&self) -> &DescriptorTable {
        &self.table
    }

    /// Get the build operation
    pub fn builder(&self) -> &B {
        &self.builder
    }

    /// Descriptor keys built so far
    pub fn built(&self) -> &[PathBuf] {
        &self.built
    }

    /// Compute the build order
    pub fn build_order(&self) -> Result<BuildOrder, ResolverError> {
        self.table.graph().topological_sort()
    }

    /// Build every descriptor in dependency order
    ///
    /// Names in the order that no descriptor produces are external and
    /// skipped. A descriptor producing several names is built once, on the
    /// first of its names in the order.
    pub fn build_all(&mut self) -> Result<(), BuildError> {
        let order = self.build_order()?;
        tracing::info!("Building {} packages in dependency order", self.table.len());

        for package in &order.order {
            if let Some(key) = self.table.first_unvisited_producer(package) {
                self.build_descriptor(&key)?;
            }
        }
        Ok(())
    }

    /// Build `package` after its transitive build dependencies
    ///
    /// Dependencies with no local descriptor are assumed to come from the
    /// base system. A failing dependency build aborts the whole request.
    pub fn build_package(&mut self, package: &str) -> Result<(), BuildError> {
        // A cycle would make the recursion below unbounded
        self.build_order()?;

        if self.table.producers(package).is_empty() {
            tracing::error!("Package '{package}' not found");
            return Err(ResolverError::PackageNotFound {
                name: package.to_string(),
            }
            .into());
        }

        self.build_with_dependencies(package)?;
        Ok(())
    }

    /// Returns `false` when no local descriptor produces `package`
    fn build_with_dependencies(&mut self, package: &str) -> Result<bool, BuildError> {
        let producers = self.table.producers(package);
        if producers.is_empty() {
            return Ok(false);
        }

        for key in producers {
            let Some(descriptor) = self.table.get(&key) else {
                continue;
            };
            if descriptor.visited {
                continue;
            }

            for dependency in descriptor.dependencies.clone() {
                if !self.build_with_dependencies(&dependency)? {
                    tracing::warn!(
                        "Dependency '{dependency}' of '{package}' not found locally, assuming it is provided by the base system"
                    );
                }
            }

            self.build_descriptor(&key)?;
        }
        Ok(true)
    }

    fn build_descriptor(&mut self, key: &Path) -> Result<(), BuildError> {
        let Some(descriptor) = self.table.get(key) else {
            return Ok(());
        };
        if descriptor.visited {
            return Ok(());
        }

        tracing::info!("Building {:?}...", descriptor.packages);
        self.builder.build(descriptor)?;
        self.table.mark_visited(key);
        self.built.push(key.to_path_buf());
        Ok(())
    }
}
