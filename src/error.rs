//! Error types for rosdeb
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

use crate::infra::git::GitError;
use crate::infra::process::ToolError;

/// Dependency resolution errors
#[derive(Error, Debug)]
pub enum ResolverError {
    /// Circular dependency detected
    #[error("Circular dependency detected: {}", cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    /// Two manifests declare the same package name
    #[error("Package '{name}' is declared twice: '{first}' and '{second}'")]
    DuplicatePackage {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Workspace scanning errors
#[derive(Error, Debug)]
pub enum ScanError {
    /// Workspace root does not exist
    #[error("Workspace not found: {path}")]
    WorkspaceNotFound { path: PathBuf },

    /// Malformed package manifest
    #[error("Invalid package manifest '{path}': {error}")]
    PackageXml { path: PathBuf, error: String },

    /// Resolver error
    #[error("Resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// IO error while walking the workspace
    #[error("IO error for '{path}': {error}")]
    Io { path: PathBuf, error: String },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// Failed to move file
    #[error("Failed to move '{from}' to '{to}': {error}")]
    MoveFile {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },
}

/// Control-file parse errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// Continuation line without a preceding field
    #[error("line {line}: continuation line without a field")]
    OrphanContinuation { line: usize },

    /// Line that is neither a field nor a continuation
    #[error("line {line}: expected 'Key: value', got '{content}'")]
    MalformedField { line: usize, content: String },

    /// Required field missing
    #[error("missing field '{field}'")]
    MissingField { field: String },

    /// Changelog has no entry to rewrite
    #[error("changelog is empty")]
    EmptyChangelog,

    /// Artifact record has no entry
    #[error("artifact record is empty")]
    EmptyArtifactRecord,
}

/// Per-module build step errors
///
/// Every variant names the module and the step that failed.
#[derive(Error, Debug)]
pub enum BuildError {
    /// Removing stale build directories failed
    #[error("Module '{module}' failed to clear stale build directories: {source}")]
    Clear {
        module: String,
        source: FilesystemError,
    },

    /// Control-file generator failed
    #[error("Module '{module}' failed during metadata generation: {source}")]
    Generation { module: String, source: ToolError },

    /// Patching generated metadata failed
    #[error("Module '{module}' failed to patch '{}': {error}", file.display())]
    Patch {
        module: String,
        file: PathBuf,
        error: String,
    },

    /// Artifact build failed
    #[error("Module '{module}' failed to build: {error}")]
    Build { module: String, error: String },

    /// Transient installation failed
    #[error("Module '{module}' failed to install: {source}")]
    Install { module: String, source: ToolError },

    /// Reading back build metadata failed
    #[error("Module '{module}' failed to extract metadata from '{}': {error}", file.display())]
    Extraction {
        module: String,
        file: PathBuf,
        error: String,
    },

    /// Moving the artifact to the output directory failed
    #[error("Module '{module}' failed to relocate artifact: {source}")]
    Relocation {
        module: String,
        source: FilesystemError,
    },

    /// Transition requested from a state that has no successor
    #[error("Module '{module}' cannot advance from state {state}")]
    InvalidTransition { module: String, state: String },
}

impl BuildError {
    /// Name of the module the error belongs to
    pub fn module(&self) -> &str {
        match self {
            Self::Clear { module, .. }
            | Self::Generation { module, .. }
            | Self::Patch { module, .. }
            | Self::Build { module, .. }
            | Self::Install { module, .. }
            | Self::Extraction { module, .. }
            | Self::Relocation { module, .. }
            | Self::InvalidTransition { module, .. } => module,
        }
    }
}

/// Failure while removing a transiently installed package
#[derive(Error, Debug)]
pub enum UninstallError {
    /// Package manager failed to purge the package
    #[error("Failed to uninstall '{package}' (module '{module}'): {source}")]
    Purge {
        module: String,
        package: String,
        source: ToolError,
    },

    /// Module never reached a state with an installed package
    #[error("Module '{module}' has nothing to uninstall in state {state}")]
    NotInstalled { module: String, state: String },
}

impl UninstallError {
    /// Name of the module the error belongs to
    pub fn module(&self) -> &str {
        match self {
            Self::Purge { module, .. } | Self::NotInstalled { module, .. } => module,
        }
    }
}

/// Top-level error of a packaging run
#[derive(Error, Debug)]
pub enum RunError {
    /// Workspace could not be scanned
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// Branch fingerprint could not be read
    #[error("Fingerprint error: {0}")]
    Fingerprint(#[from] GitError),

    /// A required tool is unavailable
    #[error("Toolchain error: {0}")]
    Toolchain(#[from] ToolError),

    /// A module build step failed
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Manifest could not be written
    #[error("Failed to persist manifest: {0}")]
    Persist(#[from] FilesystemError),

    /// Manifest could not be serialized
    #[error("Failed to serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),

    /// One or more packages could not be uninstalled
    #[error("{} module(s) could not be uninstalled: {}", failures.len(), summarize(failures))]
    Uninstall { failures: Vec<UninstallError> },
}

fn summarize(failures: &[UninstallError]) -> String {
    failures
        .iter()
        .map(UninstallError::module)
        .collect::<Vec<_>>()
        .join(", ")
}
