//! Clean logic
//!
//! Removes the build directories a previous packaging attempt may have
//! left in a module directory: the generated `debian/` tree and the
//! debhelper object directories.

use std::path::Path;

use crate::config::defaults::STALE_BUILD_DIRS;
use crate::error::FilesystemError;
use crate::infra::filesystem;

/// Result of clean operation
#[derive(Debug, Default)]
pub struct CleanResult {
    /// Directories that were removed
    pub removed: Vec<String>,
    /// Directories that didn't exist (skipped)
    pub skipped: Vec<String>,
}

/// Names of the directories to remove, including this host's object dir
pub fn stale_directories() -> Vec<String> {
    let host_obj = format!("obj-{}-linux-gnu", std::env::consts::ARCH);
    let mut dirs: Vec<String> = STALE_BUILD_DIRS.iter().map(ToString::to_string).collect();
    for name in [format!(".{host_obj}"), host_obj] {
        if !dirs.contains(&name) {
            dirs.push(name);
        }
    }
    dirs
}

/// Clean stale build directories from a module
///
/// Missing directories are skipped, so cleaning twice is harmless.
pub fn clean_module(module_dir: &Path) -> Result<CleanResult, FilesystemError> {
    let mut result = CleanResult::default();

    for dir_name in stale_directories() {
        if filesystem::remove_dir_all(&module_dir.join(&dir_name))? {
            result.removed.push(dir_name);
        } else {
            result.skipped.push(dir_name);
        }
    }

    Ok(result)
}
