//! Dependency resolution
//!
//! Discovers the packages of a workspace and computes their build order.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::defaults::IGNORE_MARKERS;
use crate::core::package_xml::PackageXml;
use crate::error::{ResolverError, ScanError};

/// Manifest file marking a package directory
pub const PACKAGE_MANIFEST: &str = "package.xml";

/// Dependency graph for packages
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Adjacency list: package -> dependencies
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package to the graph
    ///
    /// Dependencies on packages that are never added are ignored when
    /// sorting.
    pub fn add_package(&mut self, name: &str, dependencies: impl IntoIterator<Item = String>) {
        self.edges
            .insert(name.to_string(), dependencies.into_iter().collect());
    }

    /// Compute topological sort (build order)
    ///
    /// Returns packages in order such that dependencies come before
    /// dependents. Ties are broken by name, so the order is stable.
    pub fn topological_sort(&self) -> Result<Vec<String>, ResolverError> {
        let mut visited = HashSet::new();
        let mut temp_visited = HashSet::new();
        let mut result = Vec::new();
        let mut cycle_path = Vec::new();

        for node in self.edges.keys() {
            if !visited.contains(node) {
                self.visit(
                    node,
                    &mut visited,
                    &mut temp_visited,
                    &mut result,
                    &mut cycle_path,
                )?;
            }
        }

        Ok(result)
    }

    fn visit(
        &self,
        node: &str,
        visited: &mut HashSet<String>,
        temp_visited: &mut HashSet<String>,
        result: &mut Vec<String>,
        cycle_path: &mut Vec<String>,
    ) -> Result<(), ResolverError> {
        if temp_visited.contains(node) {
            // Report only the loop itself, not the path leading into it
            let start = cycle_path.iter().position(|n| n == node).unwrap_or(0);
            let mut cycle = cycle_path[start..].to_vec();
            cycle.push(node.to_string());
            return Err(ResolverError::CircularDependency { cycle });
        }

        if visited.contains(node) {
            return Ok(());
        }

        temp_visited.insert(node.to_string());
        cycle_path.push(node.to_string());

        if let Some(deps) = self.edges.get(node) {
            for dep in deps.iter().filter(|d| self.edges.contains_key(*d)) {
                self.visit(dep, visited, temp_visited, result, cycle_path)?;
            }
        }

        cycle_path.pop();
        temp_visited.remove(node);
        visited.insert(node.to_string());
        result.push(node.to_string());

        Ok(())
    }

    /// Check if the graph has any cycles
    pub fn has_cycle(&self) -> bool {
        self.topological_sort().is_err()
    }
}

/// A package found in the workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    /// Package directory relative to the workspace root
    pub path: PathBuf,
    /// Parsed manifest
    pub manifest: PackageXml,
    /// Location of the `package.xml`
    pub manifest_path: PathBuf,
}

/// Find every package under `root` and return them in build order
pub fn resolve(root: &Path) -> Result<Vec<ResolvedPackage>, ScanError> {
    let mut packages: BTreeMap<String, ResolvedPackage> = BTreeMap::new();

    for manifest_path in discover_manifests(root)? {
        let content =
            std::fs::read_to_string(&manifest_path).map_err(|e| ScanError::Io {
                path: manifest_path.clone(),
                error: e.to_string(),
            })?;
        let manifest = PackageXml::parse(&content).map_err(|error| ScanError::PackageXml {
            path: manifest_path.clone(),
            error,
        })?;

        if !manifest.has_canonical_version() {
            tracing::warn!(
                "Package '{}' declares non-canonical version '{}'",
                manifest.name,
                manifest.version
            );
        }

        let dir = manifest_path.parent().unwrap_or(root);
        let path = dir.strip_prefix(root).unwrap_or(dir).to_path_buf();

        if let Some(existing) = packages.get(&manifest.name) {
            return Err(ResolverError::DuplicatePackage {
                name: manifest.name,
                first: existing.manifest_path.clone(),
                second: manifest_path,
            }
            .into());
        }

        packages.insert(
            manifest.name.clone(),
            ResolvedPackage {
                path,
                manifest,
                manifest_path,
            },
        );
    }

    let mut graph = DependencyGraph::new();
    for name in packages.keys() {
        graph.add_package(name, ordering_dependencies(&packages, name));
    }

    let order = graph.topological_sort()?;
    Ok(order
        .into_iter()
        .filter_map(|name| packages.remove(&name))
        .collect())
}

/// Workspace packages that must be installed before `name` builds
///
/// These are its build dependencies plus everything those need at run
/// time, transitively. Run dependencies of `name` itself do not order it,
/// so packages may depend on each other at run time.
fn ordering_dependencies(packages: &BTreeMap<String, ResolvedPackage>, name: &str) -> BTreeSet<String> {
    let Some(pkg) = packages.get(name) else {
        return BTreeSet::new();
    };

    let mut ordered = BTreeSet::new();
    let mut pending: Vec<&String> = pkg.manifest.build_dependencies.iter().collect();
    while let Some(dep) = pending.pop() {
        if dep == name || ordered.contains(dep) {
            continue;
        }
        let Some(dep_pkg) = packages.get(dep) else {
            continue;
        };
        ordered.insert(dep.clone());
        pending.extend(dep_pkg.manifest.run_dependencies.iter());
    }
    ordered
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|s| s.starts_with('.'))
}

fn is_ignored(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && IGNORE_MARKERS
            .iter()
            .any(|marker| entry.path().join(marker).exists())
}

/// Collect `package.xml` paths, without descending into package directories
fn discover_manifests(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut manifests = Vec::new();
    let mut walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| ScanError::Io {
            path: e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf),
            error: e.to_string(),
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }
        if is_hidden(&entry) || is_ignored(&entry) {
            walker.skip_current_dir();
            continue;
        }

        let manifest = entry.path().join(PACKAGE_MANIFEST);
        if manifest.is_file() {
            manifests.push(manifest);
            walker.skip_current_dir();
        }
    }

    Ok(manifests)
}
