//! Build command implementation
//!
//! Packages a workspace and prints where the artifacts went.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::cli::output::{create_build_bar, format_summary};
use crate::core::fingerprint::ReleaseMode;
use crate::core::global_config::GlobalConfig;
use crate::core::orchestrator::{Orchestrator, RunConfig};
use crate::infra::dirs::RosdebDirs;
use crate::infra::git::GitRepository;
use crate::infra::toolchain::Toolchain;

/// Build options
pub struct BuildOptions {
    /// Prefix for Debian package names
    pub prefix: String,
    /// Architecture written into binary packages
    pub arch: String,
}

/// Execute the build command
pub async fn execute(workspace: &Path, options: BuildOptions) -> Result<()> {
    let dirs = RosdebDirs::new();
    let config = GlobalConfig::load(&dirs).with_context(|| "Failed to load global configuration")?;

    let release = ReleaseMode::from_env();
    tracing::debug!("Release mode: {release:?}");

    let orchestrator = Orchestrator::new(
        Toolchain::new(config.toolchain_config()),
        Arc::new(GitRepository),
        RunConfig {
            manifest_path: config.manifest_path(),
            dist_dir: config.dist_dir(),
            release,
        },
    )
    .with_progress(create_build_bar(0));

    let workspace = workspace.to_path_buf();
    let manifest = tokio::task::spawn_blocking(move || {
        orchestrator.run(&workspace, &options.prefix, &options.arch)
    })
    .await
    .with_context(|| "Packaging task did not complete")??;

    println!("{}", format_summary(&manifest));
    Ok(())
}
