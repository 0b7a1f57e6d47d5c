//! Run manifest
//!
//! The run manifest records the source state a run was built from and
//! every module it produced, in build order. It is written once, at the
//! end of a run, for the publishing step to pick up.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::fingerprint::BranchInfo;
use crate::core::module::ModuleDescriptor;
use crate::error::RunError;
use crate::infra::filesystem;

/// Record of one packaging run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunManifest {
    /// Sanitized branch label
    pub branch_label: String,

    /// Commits reachable from HEAD
    pub commit_count: u64,

    /// Abbreviated commit id
    pub commit_hash: String,

    /// Completed modules, in build order
    #[serde(default)]
    pub modules: Vec<ModuleDescriptor>,
}

impl RunManifest {
    /// Start a manifest for the given source state
    pub fn new(branch: &BranchInfo) -> Self {
        Self {
            branch_label: branch.branch_label.clone(),
            commit_count: branch.commit_count,
            commit_hash: branch.commit_hash.clone(),
            modules: Vec::new(),
        }
    }

    /// Append a completed module
    pub fn push(&mut self, module: ModuleDescriptor) {
        self.modules.push(module);
    }

    /// Parse from JSON string
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the manifest to `path`
    pub fn save(&self, path: &Path) -> Result<(), RunError> {
        let json = self.to_json()?;
        filesystem::write_file(path, &json)?;
        Ok(())
    }

    /// Load a manifest from `path`
    pub fn load(path: &Path) -> Result<Self, RunError> {
        let content = filesystem::read_file(path)?;
        Ok(Self::from_json(&content)?)
    }
}
