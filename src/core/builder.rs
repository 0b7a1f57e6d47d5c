//! Per-module build state machine
//!
//! A [`ModuleBuilder`] carries one module from a clean source tree to a
//! relocated Debian artifact. Every transition takes the current
//! [`BuildSnapshot`] and returns the next one; snapshots are never mutated.
//!
//! ```text
//! Cleared -> MetadataGenerated -> ControlPatched -> [DataPatched] -> Built
//!         -> Installed -> MetadataExtracted -> Relocated -> Uninstalled
//! ```
//!
//! `DataPatched` is only visited by data packages. `Uninstalled` is reached
//! through [`ModuleBuilder::uninstall`], which only the orchestrator calls.

use std::fmt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::defaults::{ARCH_INDEPENDENT, INTERFACE_EXTENSIONS};
use crate::core::clean;
use crate::core::control::{self, ControlFile, DataHooks, HOOK_HEADER, RULES_OVERRIDES};
use crate::core::fingerprint::{BranchInfo, ReleaseMode};
use crate::core::module::ModuleDescriptor;
use crate::error::{BuildError, UninstallError};
use crate::infra::filesystem;
use crate::infra::toolchain::Toolchain;

/// Build lifecycle states, in the order they are visited
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuildState {
    Cleared,
    MetadataGenerated,
    ControlPatched,
    DataPatched,
    Built,
    Installed,
    MetadataExtracted,
    Relocated,
    Uninstalled,
}

impl BuildState {
    /// Successor reachable through [`ModuleBuilder::step`]
    pub fn next(self, data_package: bool) -> Option<Self> {
        match self {
            Self::Cleared => Some(Self::MetadataGenerated),
            Self::MetadataGenerated => Some(Self::ControlPatched),
            Self::ControlPatched if data_package => Some(Self::DataPatched),
            Self::ControlPatched | Self::DataPatched => Some(Self::Built),
            Self::Built => Some(Self::Installed),
            Self::Installed => Some(Self::MetadataExtracted),
            Self::MetadataExtracted => Some(Self::Relocated),
            Self::Relocated | Self::Uninstalled => None,
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cleared => "Cleared",
            Self::MetadataGenerated => "MetadataGenerated",
            Self::ControlPatched => "ControlPatched",
            Self::DataPatched => "DataPatched",
            Self::Built => "Built",
            Self::Installed => "Installed",
            Self::MetadataExtracted => "MetadataExtracted",
            Self::Relocated => "Relocated",
            Self::Uninstalled => "Uninstalled",
        };
        f.write_str(name)
    }
}

/// Immutable view of a module at one point of its build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSnapshot {
    /// State reached
    pub state: BuildState,
    /// Descriptor as of this state
    pub descriptor: ModuleDescriptor,
    /// Current artifact location, once built
    pub artifact_path: Option<PathBuf>,
}

/// Run-wide settings shared by every builder
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Prefix for Debian package names
    pub prefix: String,
    /// Architecture written into binary paragraphs
    pub arch: String,
    /// Release or development build
    pub release: ReleaseMode,
    /// Source state of the run
    pub branch: BranchInfo,
    /// Absolute directory collecting finished artifacts
    pub dist_dir: PathBuf,
}

/// Drives one module through its build states
#[derive(Debug, Clone)]
pub struct ModuleBuilder {
    descriptor: ModuleDescriptor,
    toolchain: Toolchain,
    context: BuildContext,
    data_package: bool,
}

impl ModuleBuilder {
    /// Create a builder for a scanned module
    pub fn new(descriptor: ModuleDescriptor, toolchain: Toolchain, context: BuildContext) -> Self {
        let data_package = is_data_package(&descriptor.absolute_path);
        Self {
            descriptor,
            toolchain,
            context,
            data_package,
        }
    }

    /// The module as scanned
    pub fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    /// Whether the module defines message, service or action interfaces
    pub fn is_data_package(&self) -> bool {
        self.data_package
    }

    fn module_dir(&self) -> &Path {
        &self.descriptor.absolute_path
    }

    fn debian_file(&self, name: &str) -> PathBuf {
        self.module_dir().join("debian").join(name)
    }

    /// Enter the lifecycle: remove stale build directories
    pub fn clear(&self) -> Result<BuildSnapshot, BuildError> {
        let name = &self.descriptor.name;
        let result = clean::clean_module(self.module_dir()).map_err(|source| BuildError::Clear {
            module: name.clone(),
            source,
        })?;
        if !result.removed.is_empty() {
            tracing::debug!("{name}: removed {}", result.removed.join(", "));
        }
        tracing::info!("{name}: {}", BuildState::Cleared);

        Ok(BuildSnapshot {
            state: BuildState::Cleared,
            descriptor: self.descriptor.clone(),
            artifact_path: None,
        })
    }

    /// Advance one state
    pub fn step(&self, snapshot: &BuildSnapshot) -> Result<BuildSnapshot, BuildError> {
        let Some(next) = snapshot.state.next(self.data_package) else {
            return Err(self.invalid(snapshot.state));
        };

        let advanced = match next {
            BuildState::MetadataGenerated => self.generate(snapshot)?,
            BuildState::ControlPatched => self.patch_control(snapshot)?,
            BuildState::DataPatched => self.patch_data(snapshot)?,
            BuildState::Built => self.build(snapshot)?,
            BuildState::Installed => self.install(snapshot)?,
            BuildState::MetadataExtracted => self.extract(snapshot)?,
            BuildState::Relocated => self.relocate(snapshot)?,
            BuildState::Cleared | BuildState::Uninstalled => return Err(self.invalid(snapshot.state)),
        };

        tracing::info!("{}: {next}", self.descriptor.name);
        Ok(BuildSnapshot {
            state: next,
            ..advanced
        })
    }

    /// Run every build state, from a clean tree up to `Relocated`
    pub fn run_to_relocated(&self) -> Result<BuildSnapshot, BuildError> {
        let mut snapshot = self.clear()?;
        while snapshot.state < BuildState::Relocated {
            snapshot = self.step(&snapshot)?;
        }
        Ok(snapshot)
    }

    /// Purge the module's package from the host
    pub fn uninstall(&self, snapshot: &BuildSnapshot) -> Result<BuildSnapshot, UninstallError> {
        let module = self.descriptor.name.clone();
        let package = match (&snapshot.state, &snapshot.descriptor.package_name) {
            (BuildState::Relocated, Some(package)) => package.clone(),
            _ => {
                return Err(UninstallError::NotInstalled {
                    module,
                    state: snapshot.state.to_string(),
                })
            }
        };

        self.toolchain
            .purge(&package)
            .map_err(|source| UninstallError::Purge {
                module: module.clone(),
                package,
                source,
            })?;
        tracing::info!("{module}: {}", BuildState::Uninstalled);

        Ok(BuildSnapshot {
            state: BuildState::Uninstalled,
            ..snapshot.clone()
        })
    }

    fn invalid(&self, state: BuildState) -> BuildError {
        BuildError::InvalidTransition {
            module: self.descriptor.name.clone(),
            state: state.to_string(),
        }
    }

    fn patch_error(&self, file: &Path, error: impl fmt::Display) -> BuildError {
        BuildError::Patch {
            module: self.descriptor.name.clone(),
            file: file.to_path_buf(),
            error: error.to_string(),
        }
    }

    fn extraction_error(&self, file: &Path, error: impl fmt::Display) -> BuildError {
        BuildError::Extraction {
            module: self.descriptor.name.clone(),
            file: file.to_path_buf(),
            error: error.to_string(),
        }
    }

    fn generate(&self, snapshot: &BuildSnapshot) -> Result<BuildSnapshot, BuildError> {
        let qualifier = self.context.release.qualifier(&self.context.branch);
        if let Some(q) = &qualifier {
            tracing::debug!("{}: version qualifier {q}", self.descriptor.name);
        }
        self.toolchain
            .generate(self.module_dir(), qualifier.as_deref())
            .map_err(|source| BuildError::Generation {
                module: self.descriptor.name.clone(),
                source,
            })?;
        Ok(snapshot.clone())
    }

    fn rewrite_control(&self, arch: &str, prefix: Option<&str>) -> Result<(), BuildError> {
        let path = self.debian_file("control");
        let content = filesystem::read_file(&path).map_err(|e| self.patch_error(&path, e))?;
        let mut control = ControlFile::parse(&content).map_err(|e| self.patch_error(&path, e))?;
        if let Some(prefix) = prefix {
            control
                .apply_prefix(prefix)
                .map_err(|e| self.patch_error(&path, e))?;
        }
        control.set_architecture(arch);
        filesystem::write_file(&path, &control.to_string()).map_err(|e| self.patch_error(&path, e))
    }

    fn patch_control(&self, snapshot: &BuildSnapshot) -> Result<BuildSnapshot, BuildError> {
        let prefix = self.context.prefix.as_str();
        self.rewrite_control(&self.context.arch, Some(prefix))?;

        let changelog = self.debian_file("changelog");
        let content = filesystem::read_file(&changelog).map_err(|e| self.patch_error(&changelog, e))?;
        let patched =
            control::prefix_changelog(&content, prefix).map_err(|e| self.patch_error(&changelog, e))?;
        filesystem::write_file(&changelog, &patched).map_err(|e| self.patch_error(&changelog, e))?;

        let rules = self.debian_file("rules");
        filesystem::append_file(&rules, RULES_OVERRIDES).map_err(|e| self.patch_error(&rules, e))?;

        Ok(snapshot.clone())
    }

    fn append_hook(&self, name: &str, fragment: &str) -> Result<(), BuildError> {
        let path = self.debian_file(name);
        let result = if path.exists() {
            filesystem::read_file(&path).and_then(|script| {
                filesystem::write_file(&path, &control::insert_hook_fragment(&script, fragment))
            })
        } else {
            filesystem::write_file(&path, &format!("{HOOK_HEADER}{fragment}"))
        };
        result
            .and_then(|()| filesystem::make_executable(&path))
            .map_err(|e| self.patch_error(&path, e))
    }

    fn patch_data(&self, snapshot: &BuildSnapshot) -> Result<BuildSnapshot, BuildError> {
        self.rewrite_control(ARCH_INDEPENDENT, None)?;

        let hooks = DataHooks::new(
            &self.toolchain.config().ros_root,
            &self.descriptor.name,
            &self.context.prefix,
        );
        self.append_hook("postinst", &hooks.postinst())?;
        self.append_hook("postrm", &hooks.postrm())?;

        Ok(snapshot.clone())
    }

    fn read_artifact_record(&self) -> Result<String, String> {
        let path = self.debian_file("files");
        let content = filesystem::read_file(&path).map_err(|e| e.to_string())?;
        control::parse_artifact_record(&content).map_err(|e| e.to_string())
    }

    fn build(&self, snapshot: &BuildSnapshot) -> Result<BuildSnapshot, BuildError> {
        let build_error = |error: String| BuildError::Build {
            module: self.descriptor.name.clone(),
            error,
        };

        self.toolchain
            .build_artifact(self.module_dir())
            .map_err(|e| build_error(e.to_string()))?;

        let artifact_name = self.read_artifact_record().map_err(build_error)?;
        let artifact = self.descriptor.build_output_dir().join(&artifact_name);
        if !artifact.is_file() {
            return Err(build_error(format!(
                "artifact '{}' was not produced",
                artifact.display()
            )));
        }
        tracing::debug!("{}: built {}", self.descriptor.name, artifact.display());

        Ok(BuildSnapshot {
            artifact_path: Some(artifact),
            ..snapshot.clone()
        })
    }

    fn install(&self, snapshot: &BuildSnapshot) -> Result<BuildSnapshot, BuildError> {
        let Some(artifact) = &snapshot.artifact_path else {
            return Err(self.invalid(snapshot.state));
        };
        self.toolchain
            .install(artifact)
            .map_err(|source| BuildError::Install {
                module: self.descriptor.name.clone(),
                source,
            })?;
        Ok(snapshot.clone())
    }

    fn extract(&self, snapshot: &BuildSnapshot) -> Result<BuildSnapshot, BuildError> {
        let files = self.debian_file("files");
        let artifact_name = self
            .read_artifact_record()
            .map_err(|e| self.extraction_error(&files, e))?;

        let control_path = self.debian_file("control");
        let content =
            filesystem::read_file(&control_path).map_err(|e| self.extraction_error(&control_path, e))?;
        let control =
            ControlFile::parse(&content).map_err(|e| self.extraction_error(&control_path, e))?;
        let package_name = control
            .first_package()
            .map_err(|e| self.extraction_error(&control_path, e))?
            .to_string();

        let descriptor = snapshot
            .descriptor
            .with_artifact(artifact_name, package_name)
            .ok_or_else(|| self.extraction_error(&files, "artifact metadata already recorded"))?;

        Ok(BuildSnapshot {
            descriptor,
            ..snapshot.clone()
        })
    }

    fn relocate(&self, snapshot: &BuildSnapshot) -> Result<BuildSnapshot, BuildError> {
        let Some(artifact) = &snapshot.artifact_path else {
            return Err(self.invalid(snapshot.state));
        };
        let dest = filesystem::move_into(artifact, &self.context.dist_dir).map_err(|source| {
            BuildError::Relocation {
                module: self.descriptor.name.clone(),
                source,
            }
        })?;

        Ok(BuildSnapshot {
            state: snapshot.state,
            descriptor: snapshot.descriptor.with_artifact_path(dest.clone()),
            artifact_path: Some(dest),
        })
    }
}

/// Whether a module tree contains message, service or action definitions
pub fn is_data_package(module_dir: &Path) -> bool {
    WalkDir::new(module_dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .any(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| INTERFACE_EXTENSIONS.contains(&ext))
        })
}
