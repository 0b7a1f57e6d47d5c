//! Global configuration management
//!
//! Reads settings from `config.toml` in the config directory: tool
//! locations, the ROS distribution, and where run outputs go.
//! Environment variables take precedence over the file.

use crate::config::defaults;
use crate::infra::dirs::RosdebDirs;
use crate::infra::toolchain::ToolchainConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Global configuration error types
#[derive(Error, Debug)]
pub enum GlobalConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: String, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: String, error: String },
}

/// Global configuration for rosdeb
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// External tool locations
    #[serde(default)]
    pub tools: ToolsConfig,

    /// ROS installation settings
    #[serde(default)]
    pub ros: RosConfig,

    /// Run output locations
    #[serde(default)]
    pub output: OutputConfig,
}

/// External tool locations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Control-file generator
    pub generator: Option<String>,

    /// Unprivileged-build wrapper
    pub fakeroot: Option<String>,

    /// OS package manager
    pub package_manager: Option<String>,

    /// Privilege escalation command; empty disables it
    pub sudo: Option<String>,
}

/// ROS installation settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosConfig {
    /// ROS distribution name
    pub distro: Option<String>,

    /// Installation root, `/opt/ros/<distro>` by default
    pub root: Option<PathBuf>,
}

/// Run output locations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where the run manifest is written
    pub manifest_path: Option<PathBuf>,

    /// Artifact directory, relative to the workspace
    pub dist_dir: Option<PathBuf>,
}

impl GlobalConfig {
    /// Load global configuration from the config directory
    ///
    /// If the config file doesn't exist, returns default configuration.
    pub fn load(dirs: &RosdebDirs) -> Result<Self, GlobalConfigError> {
        Self::load_from_path(&dirs.global_config_path())
    }

    /// Load global configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, GlobalConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| GlobalConfigError::ReadError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| GlobalConfigError::ParseError {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }

    /// Get the effective ROS distribution
    ///
    /// `ROS_DISTRO` wins over the file, which wins over the default.
    #[must_use]
    pub fn ros_distro(&self) -> String {
        std::env::var(defaults::ENV_ROS_DISTRO)
            .ok()
            .filter(|d| !d.is_empty())
            .or_else(|| self.ros.distro.clone())
            .unwrap_or_else(|| defaults::DEFAULT_ROS_DISTRO.to_string())
    }

    /// Get the effective manifest location
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        std::env::var(defaults::ENV_MANIFEST_PATH)
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .or_else(|| self.output.manifest_path.clone())
            .unwrap_or_else(|| PathBuf::from(defaults::DEFAULT_MANIFEST_PATH))
    }

    /// Get the effective artifact directory name
    #[must_use]
    pub fn dist_dir(&self) -> PathBuf {
        self.output
            .dist_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(defaults::DEFAULT_DIST_DIR))
    }

    /// Build the toolchain configuration from these settings
    #[must_use]
    pub fn toolchain_config(&self) -> ToolchainConfig {
        let distro = self.ros_distro();
        let ros_root = self
            .ros
            .root
            .clone()
            .unwrap_or_else(|| PathBuf::from("/opt/ros").join(&distro));

        ToolchainConfig {
            generator: self
                .tools
                .generator
                .clone()
                .unwrap_or_else(|| defaults::DEFAULT_GENERATOR.to_string()),
            fakeroot: self
                .tools
                .fakeroot
                .clone()
                .unwrap_or_else(|| defaults::DEFAULT_FAKEROOT.to_string()),
            package_manager: self
                .tools
                .package_manager
                .clone()
                .unwrap_or_else(|| defaults::DEFAULT_PACKAGE_MANAGER.to_string()),
            sudo: self
                .tools
                .sudo
                .clone()
                .unwrap_or_else(|| defaults::DEFAULT_SUDO.to_string()),
            ros_distro: distro,
            ros_root,
        }
    }
}
