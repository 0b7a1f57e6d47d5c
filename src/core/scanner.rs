//! Workspace scanning
//!
//! Turns a workspace directory into the ordered list of modules to build.

use std::path::{Path, PathBuf};

use crate::core::module::ModuleDescriptor;
use crate::core::resolver;
use crate::error::ScanError;
use crate::infra::dirs::expand_home;

/// Produces build-ordered module descriptors for a workspace
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkspaceScanner;

impl WorkspaceScanner {
    /// Create a new scanner
    pub fn new() -> Self {
        Self
    }

    /// Resolve the workspace root to an absolute, existing directory
    pub fn locate(&self, workspace: &Path) -> Result<PathBuf, ScanError> {
        let expanded = expand_home(workspace);
        expanded
            .canonicalize()
            .ok()
            .filter(|p| p.is_dir())
            .ok_or(ScanError::WorkspaceNotFound { path: expanded })
    }

    /// Scan a workspace
    ///
    /// Every module appears after all modules it depends on. An empty
    /// workspace is not an error.
    pub fn scan(&self, workspace: &Path) -> Result<Vec<ModuleDescriptor>, ScanError> {
        let root = self.locate(workspace)?;

        let modules: Vec<ModuleDescriptor> = resolver::resolve(&root)?
            .into_iter()
            .map(|pkg| {
                let absolute_path = pkg
                    .manifest_path
                    .parent()
                    .map_or_else(|| root.clone(), Path::to_path_buf);
                ModuleDescriptor::new(pkg.manifest.name, pkg.path, absolute_path, pkg.manifest.version)
            })
            .collect();

        if modules.is_empty() {
            tracing::warn!("No buildable modules found in {}", root.display());
        } else {
            tracing::info!("Found {} modules in {}", modules.len(), root.display());
        }

        Ok(modules)
    }
}
