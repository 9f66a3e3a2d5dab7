//! Dependency resolution
//!
//! Handles computing build order and detecting dependency cycles.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::core::descriptor::PackageDescriptor;
use crate::error::ResolverError;

/// Dependency graph over binary package names
///
/// Edges point from a dependency to the packages that build-depend on it.
/// Dependency names nobody produces still become vertices (in-degree 0):
/// they are satisfied by the base system.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// Adjacency list: package -> dependents
    dependents: HashMap<String, Vec<String>>,
    /// Number of unresolved dependencies per package
    in_degree: HashMap<String, usize>,
    /// Vertices in discovery order
    nodes: Vec<String>,
}

/// Result of a successful topological sort
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOrder {
    /// Package names, dependencies before dependents
    pub order: Vec<String>,
}

impl BuildOrder {
    /// Position of a package in the order
    pub fn position(&self, package: &str) -> Option<usize> {
        self.order.iter().position(|p| p == package)
    }
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from descriptors
    ///
    /// Vertices follow the iteration order of `descriptors`, which for a
    /// [`DescriptorTable`](crate::core::descriptor::DescriptorTable) is
    /// discovery order. All produced packages are registered before any
    /// edge so real packages come ahead of external-only dependencies.
    pub fn from_descriptors<'a, I>(descriptors: I) -> Self
    where
        I: IntoIterator<Item = &'a PackageDescriptor>,
    {
        let descriptors: Vec<&PackageDescriptor> = descriptors.into_iter().collect();
        let mut graph = Self::new();
        for descriptor in &descriptors {
            for package in &descriptor.packages {
                graph.add_node(package);
            }
        }
        for descriptor in &descriptors {
            for package in &descriptor.packages {
                for dependency in &descriptor.dependencies {
                    graph.add_edge(dependency, package);
                }
            }
        }
        graph
    }

    /// Register a vertex if it is not known yet
    pub fn add_node(&mut self, name: &str) {
        if !self.in_degree.contains_key(name) {
            self.in_degree.insert(name.to_string(), 0);
            self.dependents.insert(name.to_string(), Vec::new());
            self.nodes.push(name.to_string());
        }
    }

    /// Add a package together with its build dependencies
    pub fn add_package(&mut self, name: &str, dependencies: &[String]) {
        self.add_node(name);
        for dependency in dependencies {
            self.add_edge(dependency, name);
        }
    }

    /// Record that `dependent` build-depends on `dependency`
    pub fn add_edge(&mut self, dependency: &str, dependent: &str) {
        self.add_node(dependency);
        self.add_node(dependent);
        if let Some(list) = self.dependents.get_mut(dependency) {
            list.push(dependent.to_string());
        }
        if let Some(degree) = self.in_degree.get_mut(dependent) {
            *degree += 1;
        }
    }

    /// Vertices in discovery order
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Packages that build-depend on `name`
    pub fn dependents(&self, name: &str) -> &[String] {
        self.dependents.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of build dependencies of `name`
    pub fn in_degree(&self, name: &str) -> usize {
        self.in_degree.get(name).copied().unwrap_or(0)
    }

    /// Compute a build order with Kahn's algorithm
    ///
    /// Ties between ready vertices are broken by discovery order. When no
    /// vertex starts at in-degree 0, the vertex with the lowest in-degree
    /// (first seen on a tie) is forced into the queue once. A vertex that
    /// is emitted before all its dependencies were, or never emitted at
    /// all, is unresolved and the sort fails.
    pub fn topological_sort(&self) -> Result<BuildOrder, ResolverError> {
        let mut in_degree = self.in_degree.clone();
        let mut queue: VecDeque<&str> = self
            .nodes
            .iter()
            .filter(|n| in_degree.get(n.as_str()) == Some(&0))
            .map(String::as_str)
            .collect();

        let mut forced = None;
        if queue.is_empty() {
            let min = self
                .nodes
                .iter()
                .min_by_key(|n| in_degree.get(n.as_str()).copied().unwrap_or(usize::MAX));
            if let Some(min) = min {
                tracing::warn!("No package with in-degree 0, possible cycle detected");
                tracing::warn!("Forcing {min} into the queue");
                queue.push_back(min.as_str());
                forced = Some(min.as_str());
            }
        }

        let mut order = Vec::with_capacity(self.nodes.len());
        let mut emitted: HashSet<&str> = HashSet::new();

        while let Some(package) = queue.pop_front() {
            if !emitted.insert(package) {
                continue;
            }
            order.push(package.to_string());

            for dependent in self.dependents(package) {
                if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 && !emitted.contains(dependent.as_str()) {
                        queue.push_back(dependent.as_str());
                    }
                }
            }
        }

        let unresolved: Vec<String> = self
            .nodes
            .iter()
            .filter(|n| !emitted.contains(n.as_str()) || forced == Some(n.as_str()))
            .cloned()
            .collect();

        if unresolved.is_empty() {
            tracing::debug!("No cycle detected in dependencies");
            Ok(BuildOrder { order })
        } else {
            tracing::error!("Cycle detected in dependencies! Halting build");
            Err(ResolverError::CircularDependency {
                unresolved,
                forced: forced.map(ToString::to_string),
            })
        }
    }

    /// Check if the graph has any cycles
    pub fn has_cycle(&self) -> bool {
        self.topological_sort().is_err()
    }
}
