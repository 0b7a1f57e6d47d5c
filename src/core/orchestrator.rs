//! Packaging run orchestration
//!
//! Builds every module of a workspace in dependency order, installing each
//! one so later modules can build against it, then removes the transient
//! installs in reverse order and persists the run manifest.

use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::builder::{BuildContext, BuildSnapshot, ModuleBuilder};
use crate::core::fingerprint::{BranchInfo, ReleaseMode};
use crate::core::manifest::RunManifest;
use crate::core::scanner::WorkspaceScanner;
use crate::error::RunError;
use crate::infra::git::VersionControl;
use crate::infra::toolchain::Toolchain;

/// Settings of a packaging run that do not vary per invocation
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Where the run manifest is written
    pub manifest_path: PathBuf,
    /// Artifact directory; relative paths are taken from the workspace root
    pub dist_dir: PathBuf,
    /// Release or development build
    pub release: ReleaseMode,
}

/// Drives a whole packaging run
pub struct Orchestrator {
    toolchain: Toolchain,
    vcs: Arc<dyn VersionControl>,
    config: RunConfig,
    scanner: WorkspaceScanner,
    progress: ProgressBar,
}

impl Orchestrator {
    /// Create an orchestrator
    pub fn new(toolchain: Toolchain, vcs: Arc<dyn VersionControl>, config: RunConfig) -> Self {
        Self {
            toolchain,
            vcs,
            config,
            scanner: WorkspaceScanner::new(),
            progress: ProgressBar::hidden(),
        }
    }

    /// Report module progress on `bar`
    #[must_use]
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = bar;
        self
    }

    /// Package every module of `workspace`
    ///
    /// A build failure stops the run immediately; modules installed before
    /// it stay installed and no manifest is written. Uninstall failures are
    /// collected, and reported after the manifest has been persisted.
    pub fn run(&self, workspace: &Path, prefix: &str, arch: &str) -> Result<RunManifest, RunError> {
        let root = self.scanner.locate(workspace)?;
        let branch = BranchInfo::capture(self.vcs.as_ref(), &root)?;
        tracing::info!("Source state: {branch}");
        let mut manifest = RunManifest::new(&branch);

        let modules = self.scanner.scan(&root)?;
        if modules.is_empty() {
            return Ok(manifest);
        }

        self.toolchain.preflight()?;

        let context = BuildContext {
            prefix: prefix.to_string(),
            arch: arch.to_string(),
            release: self.config.release,
            branch,
            dist_dir: root.join(&self.config.dist_dir),
        };

        self.progress.set_length(modules.len() as u64);
        let mut built: Vec<(ModuleBuilder, BuildSnapshot)> = Vec::with_capacity(modules.len());
        for descriptor in modules {
            self.progress.set_message(descriptor.name.clone());
            let builder = ModuleBuilder::new(descriptor, self.toolchain.clone(), context.clone());
            let snapshot = builder.run_to_relocated()?;
            manifest.push(snapshot.descriptor.clone());
            built.push((builder, snapshot));
            self.progress.inc(1);
        }
        self.progress.finish_and_clear();

        let mut failures = Vec::new();
        for (builder, snapshot) in built.iter().rev() {
            if let Err(e) = builder.uninstall(snapshot) {
                tracing::warn!("{e}");
                failures.push(e);
            }
        }

        manifest.save(&self.config.manifest_path)?;
        tracing::info!(
            "Wrote manifest for {} modules to {}",
            manifest.modules.len(),
            self.config.manifest_path.display()
        );

        if failures.is_empty() {
            Ok(manifest)
        } else {
            Err(RunError::Uninstall { failures })
        }
    }
}
