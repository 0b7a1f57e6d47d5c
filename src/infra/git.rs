//! Git operations
//!
//! Reads branch, commit count and short commit id of a checkout using the
//! gix crate.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Git operation errors
#[derive(Error, Debug)]
pub enum GitError {
    /// No repository contains the path
    #[error("Invalid repository at '{path}': {error}")]
    InvalidRepository { path: PathBuf, error: String },

    /// HEAD could not be read
    #[error("Failed to read HEAD in '{path}': {error}")]
    HeadUnreadable { path: PathBuf, error: String },

    /// History walk failed
    #[error("Failed to count commits in '{path}': {error}")]
    HistoryWalk { path: PathBuf, error: String },
}

/// Raw repository state of a checkout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoState {
    /// Short branch name, `HEAD` when detached
    pub branch: String,
    /// Number of commits reachable from HEAD
    pub commit_count: u64,
    /// Abbreviated commit id of HEAD
    pub short_hash: String,
}

/// Source of repository state
pub trait VersionControl: Send + Sync {
    /// Query the state of the checkout containing `path`
    fn state(&self, path: &Path) -> Result<RepoState, GitError>;
}

/// Reads repository state with gix
#[derive(Debug, Default, Clone, Copy)]
pub struct GitRepository;

impl VersionControl for GitRepository {
    fn state(&self, path: &Path) -> Result<RepoState, GitError> {
        let repo = gix::discover(path).map_err(|e| GitError::InvalidRepository {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let head_err = |e: String| GitError::HeadUnreadable {
            path: path.to_path_buf(),
            error: e,
        };

        // Mirrors `git rev-parse --abbrev-ref HEAD`
        let branch = repo
            .head_name()
            .map_err(|e| head_err(e.to_string()))?
            .map_or_else(|| "HEAD".to_string(), |name| name.shorten().to_string());

        let head = repo.head_id().map_err(|e| head_err(e.to_string()))?;
        let short_hash = head.shorten_or_id().to_string();

        let walk = head.ancestors().all().map_err(|e| GitError::HistoryWalk {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        let mut commit_count = 0u64;
        for info in walk {
            info.map_err(|e| GitError::HistoryWalk {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;
            commit_count += 1;
        }

        tracing::debug!(
            "Repository at {}: branch={branch} commits={commit_count} head={short_hash}",
            path.display()
        );

        Ok(RepoState {
            branch,
            commit_count,
            short_hash,
        })
    }
}
