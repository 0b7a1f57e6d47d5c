//! Platform-specific directory management
//!
//! Provides the configuration directory, following the XDG Base Directory
//! Specification on Linux.
//!
//! The `ROSDEB_CONFIG_DIR` environment variable overrides the default.

use std::env;
use std::path::PathBuf;

/// Environment variable overriding the config directory
pub const ENV_CONFIG_DIR: &str = "ROSDEB_CONFIG_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "rosdeb";

/// Platform-specific directory provider for rosdeb
#[derive(Debug, Clone)]
pub struct RosdebDirs {
    config_dir: PathBuf,
}

impl RosdebDirs {
    /// Create a new `RosdebDirs` instance
    ///
    /// Checks the environment first, then falls back to platform defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config_dir: Self::resolve_config_dir(),
        }
    }

    /// Create an instance rooted at an explicit config directory
    #[must_use]
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Get the config directory path
    ///
    /// - Linux: `$XDG_CONFIG_HOME/rosdeb` or `~/.config/rosdeb`
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// Get the global config file path
    #[must_use]
    pub fn global_config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    fn resolve_config_dir() -> PathBuf {
        if let Ok(path) = env::var(ENV_CONFIG_DIR) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".config").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".config").join(APP_NAME))
            })
    }
}

impl Default for RosdebDirs {
    fn default() -> Self {
        Self::new()
    }
}

/// Expand a leading `~` to the user's home directory
pub fn expand_home(path: &std::path::Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
