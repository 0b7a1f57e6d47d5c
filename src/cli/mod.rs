//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::config::defaults::{DEFAULT_ARCH, DEFAULT_PREFIX};
use commands::build::{self, BuildOptions};

/// Rosdeb - ROS workspace to Debian package builder
///
/// Builds every package of a ROS workspace into a Debian artifact, in
/// dependency order.
#[derive(Parser, Debug)]
#[command(name = "rosdeb")]
#[command(author, version, about, long_about = None)]
#[command(long_version = long_version())]
pub struct Cli {
    /// Workspace root directory
    pub workspace: PathBuf,

    /// Prefix for Debian package names
    #[arg(long, default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// Architecture written into binary packages
    #[arg(long, default_value = DEFAULT_ARCH)]
    pub arch: String,
}

impl Cli {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        build::execute(
            &self.workspace,
            BuildOptions {
                prefix: self.prefix,
                arch: self.arch,
            },
        )
        .await
    }
}

fn long_version() -> &'static str {
    match option_env!("VERGEN_GIT_SHA") {
        Some(sha) => {
            static VERSION: std::sync::OnceLock<String> = std::sync::OnceLock::new();
            VERSION.get_or_init(|| format!("{} ({sha})", env!("CARGO_PKG_VERSION")))
        }
        None => env!("CARGO_PKG_VERSION"),
    }
}
