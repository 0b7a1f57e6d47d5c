//! Build fingerprints
//!
//! A fingerprint identifies the source state a non-release build came
//! from: `<branch>+<commitCount>-<commitHash>`, with `/` and `_` stripped
//! from the branch so the string is valid inside a Debian revision.

use std::fmt;
use std::path::Path;

use crate::config::defaults::ENV_TAG_TRIGGER;
use crate::infra::git::{GitError, RepoState, VersionControl};

/// Branch metadata captured at the start of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchInfo {
    /// Sanitized branch label
    pub branch_label: String,
    /// Number of commits reachable from HEAD
    pub commit_count: u64,
    /// Abbreviated commit id
    pub commit_hash: String,
}

impl BranchInfo {
    /// Derive branch info from raw repository state
    pub fn from_state(state: RepoState) -> Self {
        Self {
            branch_label: sanitize_branch(&state.branch),
            commit_count: state.commit_count,
            commit_hash: state.short_hash,
        }
    }

    /// Query the repository containing `path`
    pub fn capture(vcs: &dyn VersionControl, path: &Path) -> Result<Self, GitError> {
        vcs.state(path).map(Self::from_state)
    }

    /// The fingerprint string
    pub fn fingerprint(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BranchInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}+{}-{}",
            self.branch_label, self.commit_count, self.commit_hash
        )
    }
}

/// Remove `/` and `_` from a branch name
pub fn sanitize_branch(branch: &str) -> String {
    branch.chars().filter(|c| !matches!(c, '/' | '_')).collect()
}

/// Whether a run produces canonical release artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReleaseMode {
    /// Tag-triggered build; versions are used unqualified
    Tagged,
    /// Any other build; the fingerprint qualifies the version
    #[default]
    Development,
}

impl ReleaseMode {
    /// Read the mode from `IS_TAG_TRIGGER`
    pub fn from_env() -> Self {
        Self::from_trigger(std::env::var(ENV_TAG_TRIGGER).ok().as_deref())
    }

    /// Interpret a tag-trigger value; only `"true"` selects a release
    pub fn from_trigger(value: Option<&str>) -> Self {
        match value {
            Some("true") => Self::Tagged,
            _ => Self::Development,
        }
    }

    /// Distribution qualifier to hand to the generator
    pub fn qualifier(self, branch: &BranchInfo) -> Option<String> {
        match self {
            Self::Tagged => None,
            Self::Development => Some(branch.fingerprint()),
        }
    }
}
