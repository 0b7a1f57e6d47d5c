//! Toolchain management
//!
//! Wraps the external packaging tools (bloom-generate, fakeroot, apt-get)
//! behind typed operations. Tool locations come from an explicit
//! [`ToolchainConfig`]; execution goes through a [`CommandRunner`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::defaults;
use crate::infra::process::{CommandRunner, Invocation, SystemRunner, Tool, ToolError};

/// Locations and settings of the external tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainConfig {
    /// Control-file generator
    pub generator: String,
    /// Unprivileged-build wrapper
    pub fakeroot: String,
    /// OS package manager
    pub package_manager: String,
    /// Privilege escalation command; empty disables it
    pub sudo: String,
    /// ROS distribution passed to the generator
    pub ros_distro: String,
    /// Installation root of the ROS distribution
    pub ros_root: PathBuf,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            generator: defaults::DEFAULT_GENERATOR.to_string(),
            fakeroot: defaults::DEFAULT_FAKEROOT.to_string(),
            package_manager: defaults::DEFAULT_PACKAGE_MANAGER.to_string(),
            sudo: defaults::DEFAULT_SUDO.to_string(),
            ros_distro: defaults::DEFAULT_ROS_DISTRO.to_string(),
            ros_root: PathBuf::from("/opt/ros").join(defaults::DEFAULT_ROS_DISTRO),
        }
    }
}

/// External packaging tools
#[derive(Clone)]
pub struct Toolchain {
    config: ToolchainConfig,
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Toolchain {
    /// Create a toolchain running commands on the host
    pub fn new(config: ToolchainConfig) -> Self {
        Self::with_runner(config, Arc::new(SystemRunner))
    }

    /// Create a toolchain with a custom command runner
    pub fn with_runner(config: ToolchainConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    /// Get the configuration
    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    /// Verify every configured tool resolves on this host
    pub fn preflight(&self) -> Result<(), ToolError> {
        let mut tools = vec![
            (Tool::Generator, self.config.generator.as_str()),
            (Tool::ArtifactBuilder, self.config.fakeroot.as_str()),
            (Tool::PackageManager, self.config.package_manager.as_str()),
        ];
        if !self.config.sudo.is_empty() {
            tools.push((Tool::Sudo, self.config.sudo.as_str()));
        }

        for (tool, program) in tools {
            let path = self.runner.locate(tool, program)?;
            tracing::debug!("Found {tool}: {}", path.display());
        }
        Ok(())
    }

    /// Generate Debian metadata in `module_dir`
    ///
    /// With a qualifier the generator appends it to the Debian revision;
    /// without one the version is taken as-is.
    pub fn generate(&self, module_dir: &Path, qualifier: Option<&str>) -> Result<(), ToolError> {
        let mut inv = Invocation::new(Tool::Generator, &self.config.generator)
            .args(["rosdebian", "--ros-distro", self.config.ros_distro.as_str()]);
        if let Some(qualifier) = qualifier {
            inv = inv.args(["--debian-inc", qualifier]);
        }
        let inv = inv.arg("--unsafe").current_dir(module_dir);
        self.runner.run(&inv)
    }

    /// Build the binary package from a prepared `debian/` directory
    pub fn build_artifact(&self, module_dir: &Path) -> Result<(), ToolError> {
        let inv = Invocation::new(Tool::ArtifactBuilder, &self.config.fakeroot)
            .args(["debian/rules", "binary"])
            .current_dir(module_dir);
        self.runner.run(&inv)
    }

    /// Install an artifact file on the host
    pub fn install(&self, artifact: &Path) -> Result<(), ToolError> {
        let inv = Invocation::new(Tool::PackageManager, &self.config.package_manager)
            .args(["install", "-y"])
            .arg(artifact.display().to_string())
            .elevated(&self.config.sudo);
        self.runner.run(&inv)
    }

    /// Purge an installed package from the host
    pub fn purge(&self, package: &str) -> Result<(), ToolError> {
        let inv = Invocation::new(Tool::PackageManager, &self.config.package_manager)
            .args(["purge", "-y", package])
            .elevated(&self.config.sudo);
        self.runner.run(&inv)
    }
}
