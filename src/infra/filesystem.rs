//! Filesystem operations
//!
//! Handles file and directory operations.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Remove a directory and all its contents
///
/// Returns whether anything was removed.
pub fn remove_dir_all(path: &Path) -> Result<bool, FilesystemError> {
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_dir_all(path).map_err(|e| FilesystemError::RemoveDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    Ok(true)
}

/// Write content to a file
pub fn write_file(path: &Path, content: &str) -> Result<(), FilesystemError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(path, content).map_err(|e| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Append content to a file, creating it if missing
pub fn append_file(path: &Path, content: &str) -> Result<(), FilesystemError> {
    let map_err = |e: std::io::Error| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    };
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(map_err)?;
    file.write_all(content.as_bytes()).map_err(map_err)
}

/// Read content from a file
pub fn read_file(path: &Path) -> Result<String, FilesystemError> {
    std::fs::read_to_string(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Mark a file executable for everyone (`chmod +x`)
#[cfg(unix)]
pub fn make_executable(path: &Path) -> Result<(), FilesystemError> {
    use std::os::unix::fs::PermissionsExt;

    let map_err = |e: std::io::Error| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    };
    let mut perms = std::fs::metadata(path).map_err(map_err)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    std::fs::set_permissions(path, perms).map_err(map_err)
}

#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> Result<(), FilesystemError> {
    Ok(())
}

/// Move a file into `dest_dir`, keeping its file name
///
/// Falls back to copy and remove when a rename crosses filesystems.
pub fn move_into(file: &Path, dest_dir: &Path) -> Result<PathBuf, FilesystemError> {
    let map_err = |e: std::io::Error, to: &Path| FilesystemError::MoveFile {
        from: file.to_path_buf(),
        to: to.to_path_buf(),
        error: e.to_string(),
    };

    create_dir_all(dest_dir)?;
    let Some(name) = file.file_name() else {
        return Err(FilesystemError::MoveFile {
            from: file.to_path_buf(),
            to: dest_dir.to_path_buf(),
            error: "source has no file name".to_string(),
        });
    };
    let dest = dest_dir.join(name);

    if std::fs::rename(file, &dest).is_err() {
        std::fs::copy(file, &dest).map_err(|e| map_err(e, &dest))?;
        std::fs::remove_file(file).map_err(|e| map_err(e, &dest))?;
    }

    Ok(dest)
}
