//! Module descriptors
//!
//! A [`ModuleDescriptor`] holds what is known about one buildable module:
//! the static facts found by the workspace scan, and the artifact facts
//! learned once its build has run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One buildable module of a workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
    /// Module name, unique within a workspace
    pub name: String,

    /// Module directory relative to the workspace root
    pub path: PathBuf,

    /// Absolute module directory
    pub absolute_path: PathBuf,

    /// Declared version
    pub version: String,

    /// Artifact file name, set once metadata has been extracted
    #[serde(default)]
    pub artifact_name: Option<String>,

    /// Final Debian package name, set alongside `artifact_name`
    #[serde(default)]
    pub package_name: Option<String>,

    /// Artifact location after relocation
    #[serde(default)]
    pub artifact_path: Option<PathBuf>,
}

impl ModuleDescriptor {
    /// Create a descriptor for a freshly scanned module
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        absolute_path: impl Into<PathBuf>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            absolute_path: absolute_path.into(),
            version: version.into(),
            artifact_name: None,
            package_name: None,
            artifact_path: None,
        }
    }

    /// Return a copy carrying the extracted artifact metadata
    ///
    /// Returns `None` if metadata was already recorded; it is immutable for
    /// the rest of the run.
    #[must_use]
    pub fn with_artifact(&self, artifact_name: String, package_name: String) -> Option<Self> {
        if self.artifact_name.is_some() || self.package_name.is_some() {
            return None;
        }
        Some(Self {
            artifact_name: Some(artifact_name),
            package_name: Some(package_name),
            ..self.clone()
        })
    }

    /// Return a copy recording the relocated artifact path
    #[must_use]
    pub fn with_artifact_path(&self, path: PathBuf) -> Self {
        Self {
            artifact_path: Some(path),
            ..self.clone()
        }
    }

    /// Directory the artifact builder writes into
    pub fn build_output_dir(&self) -> PathBuf {
        self.absolute_path
            .parent()
            .map_or_else(|| self.absolute_path.clone(), std::path::Path::to_path_buf)
    }
}
