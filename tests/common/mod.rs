//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests: a
//! temporary ROS workspace, stand-ins for the external packaging tools,
//! and a fixed version-control state.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use rosdeb::core::control::ControlFile;
use rosdeb::core::fingerprint::ReleaseMode;
use rosdeb::core::orchestrator::{Orchestrator, RunConfig};
use rosdeb::core::package_xml::PackageXml;
use rosdeb::infra::git::{GitError, RepoState, VersionControl};
use rosdeb::infra::process::{CommandRunner, Invocation, Tool, ToolError};
use rosdeb::infra::toolchain::{Toolchain, ToolchainConfig};

/// Temporary workspace
///
/// The workspace root is `<tmp>/ws`; the manifest is written next to it.
pub struct TestWorkspace {
    /// Temporary directory holding the workspace
    pub dir: TempDir,
}

impl TestWorkspace {
    /// Create an empty workspace
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        std::fs::create_dir_all(dir.path().join("ws")).expect("Failed to create workspace");
        Self { dir }
    }

    /// Workspace root
    pub fn path(&self) -> PathBuf {
        self.dir
            .path()
            .join("ws")
            .canonicalize()
            .expect("Failed to canonicalize workspace")
    }

    /// Where runs write their manifest
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.path().join("deb.json")
    }

    /// Artifact directory
    pub fn dist(&self) -> PathBuf {
        self.path().join("dist")
    }

    /// Add a package under `src/<name>`
    pub fn add_package(&self, name: &str, deps: &[&str]) -> &Self {
        let deps: String = deps
            .iter()
            .map(|d| format!("  <depend>{d}</depend>\n"))
            .collect();
        self.create_file(
            &format!("src/{name}/package.xml"),
            &format!(
                "<?xml version=\"1.0\"?>\n<package format=\"2\">\n  <name>{name}</name>\n  <version>1.0.0</version>\n{deps}</package>\n"
            ),
        );
        self
    }

    /// Create a file in the workspace
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Read a file from the workspace
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.path().join(name)).expect("Failed to read file")
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

type Predicate = Box<dyn Fn(&Invocation) -> bool + Send + Sync>;

/// Stand-in for bloom-generate, fakeroot and apt-get
///
/// Writes the files the real tools would, records every invocation and
/// tracks which packages are installed.
#[derive(Default)]
pub struct FakeTools {
    calls: Mutex<Vec<Invocation>>,
    installed: Mutex<Vec<String>>,
    fail_when: Option<Predicate>,
}

impl FakeTools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every invocation matching `predicate`
    pub fn failing(mut self, predicate: impl Fn(&Invocation) -> bool + Send + Sync + 'static) -> Self {
        self.fail_when = Some(Box::new(predicate));
        self
    }

    /// Every invocation, in order
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Invocations of one tool, rendered as command lines
    pub fn commands(&self, tool: Tool) -> Vec<String> {
        self.calls()
            .iter()
            .filter(|c| c.tool == tool)
            .map(ToString::to_string)
            .collect()
    }

    /// Packages currently installed, in install order
    pub fn installed(&self) -> Vec<String> {
        self.installed.lock().unwrap().clone()
    }

    /// Packages passed to purge, in order
    pub fn purged(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter(|c| c.args.iter().any(|a| a == "purge"))
            .filter_map(|c| c.args.last().cloned())
            .collect()
    }

    fn generate(inv: &Invocation, dir: &Path) {
        let pkg = PackageXml::parse(&std::fs::read_to_string(dir.join("package.xml")).unwrap()).unwrap();
        let flag = |name: &str| {
            inv.args
                .iter()
                .position(|a| a == name)
                .and_then(|i| inv.args.get(i + 1))
                .cloned()
        };
        let distro = flag("--ros-distro").unwrap();
        let inc = flag("--debian-inc").unwrap_or_else(|| "0".to_string());
        let deb = format!("ros-{distro}-{}", pkg.name.replace('_', "-"));

        let debian = dir.join("debian");
        std::fs::create_dir_all(&debian).unwrap();
        std::fs::write(
            debian.join("control"),
            format!(
                "Source: {deb}\nSection: misc\nPriority: optional\nMaintainer: Dev <dev@example.com>\nBuild-Depends: debhelper (>= 9.0.0)\n\nPackage: {deb}\nArchitecture: any\nDepends: ${{shlibs:Depends}}, ${{misc:Depends}}\nDescription: {}\n Generated for tests.\n",
                pkg.name
            ),
        )
        .unwrap();
        std::fs::write(
            debian.join("changelog"),
            format!(
                "{deb} ({}-{inc}focal) focal; urgency=high\n\n  * Autogenerated, no changelog for this version found in CHANGELOG.rst.\n\n -- Dev <dev@example.com>  Mon, 01 Jan 2024 00:00:00 -0000\n\n",
                pkg.version
            ),
        )
        .unwrap();
        std::fs::write(debian.join("rules"), "#!/usr/bin/make -f\n%:\n\tdh $@\n").unwrap();
    }

    fn build(dir: &Path) {
        let debian = dir.join("debian");
        let control = ControlFile::parse(&std::fs::read_to_string(debian.join("control")).unwrap()).unwrap();
        let changelog = std::fs::read_to_string(debian.join("changelog")).unwrap();
        let version = changelog
            .split_once('(')
            .and_then(|(_, rest)| rest.split_once(')'))
            .map(|(v, _)| v.to_string())
            .unwrap();
        let file = format!(
            "{}_{version}_{}.deb",
            control.first_package().unwrap(),
            control.architectures()[0]
        );

        std::fs::write(dir.parent().unwrap().join(&file), control.to_string()).unwrap();
        std::fs::write(debian.join("files"), format!("{file} misc optional\n")).unwrap();
    }

    fn package_manager(&self, inv: &Invocation) {
        let (Some(op), Some(target)) = (
            inv.args.iter().find(|a| *a == "install" || *a == "purge"),
            inv.args.last(),
        ) else {
            return;
        };
        let mut installed = self.installed.lock().unwrap();
        if op == "install" {
            let control = ControlFile::parse(&std::fs::read_to_string(target).unwrap()).unwrap();
            installed.push(control.first_package().unwrap().to_string());
        } else {
            installed.retain(|p| p != target);
        }
    }
}

impl CommandRunner for FakeTools {
    fn run(&self, invocation: &Invocation) -> Result<(), ToolError> {
        self.calls.lock().unwrap().push(invocation.clone());
        if self.fail_when.as_ref().is_some_and(|f| f(invocation)) {
            return Err(ToolError::Failed {
                command: invocation.to_string(),
                status: "exit status: 2".to_string(),
            });
        }

        let dir = invocation.cwd.clone().unwrap_or_else(|| PathBuf::from("."));
        match invocation.tool {
            Tool::Generator => Self::generate(invocation, &dir),
            Tool::ArtifactBuilder => Self::build(&dir),
            Tool::PackageManager => self.package_manager(invocation),
            Tool::Sudo => {}
        }
        Ok(())
    }

    fn locate(&self, _tool: Tool, program: &str) -> Result<PathBuf, ToolError> {
        Ok(PathBuf::from("/usr/bin").join(program))
    }
}

/// Version control returning a fixed state
pub struct FixedVcs {
    pub state: RepoState,
}

impl Default for FixedVcs {
    fn default() -> Self {
        Self {
            state: RepoState {
                branch: "feature/arm_v2".to_string(),
                commit_count: 42,
                short_hash: "3f2a9c1".to_string(),
            },
        }
    }
}

impl VersionControl for FixedVcs {
    fn state(&self, _path: &Path) -> Result<RepoState, GitError> {
        Ok(self.state.clone())
    }
}

/// Orchestrator wired to fake tools, writing its manifest into `workspace`
pub fn orchestrator(workspace: &TestWorkspace, tools: &Arc<FakeTools>, release: ReleaseMode) -> Orchestrator {
    let runner: Arc<dyn CommandRunner> = tools.clone();
    Orchestrator::new(
        Toolchain::with_runner(ToolchainConfig::default(), runner),
        Arc::new(FixedVcs::default()),
        RunConfig {
            manifest_path: workspace.manifest_path(),
            dist_dir: PathBuf::from("dist"),
            release,
        },
    )
}
