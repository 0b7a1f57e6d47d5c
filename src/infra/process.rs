//! External process execution
//!
//! Every external tool call goes through a [`CommandRunner`], so the build
//! pipeline can be driven against fake tools in tests.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// External tool errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// Program not found in PATH
    #[error("{tool} '{program}' not found in PATH")]
    NotFound { tool: Tool, program: String },

    /// Program could not be started
    #[error("Failed to run '{program}': {error}")]
    Spawn { program: String, error: String },

    /// Program exited unsuccessfully
    #[error("'{command}' exited with {status}")]
    Failed { command: String, status: String },
}

/// The role an external program plays in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Control-file generator (bloom-generate)
    Generator,
    /// Unprivileged-build wrapper running debian/rules (fakeroot)
    ArtifactBuilder,
    /// OS package manager (apt-get)
    PackageManager,
    /// Privilege escalation wrapper (sudo)
    Sudo,
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generator => write!(f, "generator"),
            Self::ArtifactBuilder => write!(f, "artifact builder"),
            Self::PackageManager => write!(f, "package manager"),
            Self::Sudo => write!(f, "sudo"),
        }
    }
}

/// A fully specified external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Role of the command
    pub tool: Tool,
    /// Program to execute
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Working directory, if different from the current one
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    /// Create an invocation of `program` in the given role
    pub fn new(tool: Tool, program: impl Into<String>) -> Self {
        Self {
            tool,
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Append an argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory
    #[must_use]
    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    /// Prefix the command with a privilege escalation wrapper
    ///
    /// An empty wrapper leaves the invocation unchanged.
    #[must_use]
    pub fn elevated(self, sudo: &str) -> Self {
        if sudo.is_empty() {
            return self;
        }
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(self.program);
        args.extend(self.args);
        Self {
            tool: self.tool,
            program: sudo.to_string(),
            args,
            cwd: self.cwd,
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Executes external commands synchronously
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion; a non-zero exit is an error
    fn run(&self, invocation: &Invocation) -> Result<(), ToolError>;

    /// Resolve a program to its location on this host
    fn locate(&self, tool: Tool, program: &str) -> Result<PathBuf, ToolError> {
        which::which(program).map_err(|_| ToolError::NotFound {
            tool,
            program: program.to_string(),
        })
    }
}

/// Runs commands on the host with [`std::process::Command`]
///
/// Standard output and error are inherited so tool progress stays visible;
/// only the exit status is inspected.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), ToolError> {
        tracing::debug!(tool = %invocation.tool, "Running: {invocation}");

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        if let Some(dir) = &invocation.cwd {
            cmd.current_dir(dir);
        }

        let status = cmd.status().map_err(|e| ToolError::Spawn {
            program: invocation.program.clone(),
            error: e.to_string(),
        })?;

        if !status.success() {
            return Err(ToolError::Failed {
                command: invocation.to_string(),
                status: status.to_string(),
            });
        }

        Ok(())
    }
}
