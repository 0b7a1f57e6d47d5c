//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    /// Generate a ROS package name (lowercase alphanumeric with underscores)
    pub fn module_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,20}[a-z0-9]"
    }

    /// Generate a git branch name, possibly nested and with underscores
    pub fn branch_name() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z][a-z0-9_.-]{0,12}", 1..4).prop_map(|parts| parts.join("/"))
    }

    /// Generate an abbreviated commit id
    pub fn short_hash() -> impl Strategy<Value = String> {
        "[0-9a-f]{7}"
    }

    /// Generate a valid semver version string
    pub fn semver_version() -> impl Strategy<Value = String> {
        (0u32..10, 0u32..50, 0u32..100)
            .prop_map(|(major, minor, patch)| format!("{major}.{minor}.{patch}"))
    }

    /// Generate a dependency DAG over `n` modules
    ///
    /// Module `i` may only depend on modules with a smaller index, so the
    /// result is acyclic by construction.
    pub fn dag(max_modules: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
        (1..=max_modules).prop_flat_map(|n| {
            (0..n)
                .map(|i| prop::collection::vec(0..i.max(1), 0..=i.min(3)).prop_map(move |deps| {
                    let mut deps: Vec<usize> = deps.into_iter().filter(|d| *d < i).collect();
                    deps.sort_unstable();
                    deps.dedup();
                    deps
                }))
                .collect::<Vec<_>>()
        })
    }
}

/// Fake external tools that emulate their filesystem effects
#[cfg(test)]
pub mod fakes {
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use crate::core::control::ControlFile;
    use crate::core::package_xml::PackageXml;
    use crate::infra::process::{CommandRunner, Invocation, Tool, ToolError};

    type Predicate = Box<dyn Fn(&Invocation) -> bool + Send + Sync>;

    /// Runner standing in for bloom-generate, fakeroot and apt-get
    #[derive(Default)]
    pub struct FakeRunner {
        calls: Mutex<Vec<Invocation>>,
        fail_when: Option<Predicate>,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail every invocation matching `predicate`
        #[must_use]
        pub fn failing(mut self, predicate: impl Fn(&Invocation) -> bool + Send + Sync + 'static) -> Self {
            self.fail_when = Some(Box::new(predicate));
            self
        }

        /// Invocations seen so far
        pub fn calls(&self) -> Vec<Invocation> {
            self.calls.lock().unwrap().clone()
        }

        fn generate(inv: &Invocation, dir: &Path) {
            let xml = std::fs::read_to_string(dir.join("package.xml")).unwrap();
            let pkg = PackageXml::parse(&xml).unwrap();
            let flag = |name: &str| {
                inv.args
                    .iter()
                    .position(|a| a == name)
                    .and_then(|i| inv.args.get(i + 1))
                    .cloned()
            };
            let distro = flag("--ros-distro").unwrap();
            let inc = flag("--debian-inc").unwrap_or_else(|| "0".to_string());
            let deb_name = format!("ros-{distro}-{}", pkg.name.replace('_', "-"));

            let debian = dir.join("debian");
            std::fs::create_dir_all(&debian).unwrap();
            std::fs::write(
                debian.join("control"),
                format!(
                    "Source: {deb_name}\nSection: misc\nMaintainer: Dev <dev@example.com>\n\nPackage: {deb_name}\nArchitecture: any\nDescription: {}\n generated\n",
                    pkg.name
                ),
            )
            .unwrap();
            std::fs::write(
                debian.join("changelog"),
                format!("{deb_name} ({}-{inc}focal) focal; urgency=high\n\n  * Autogenerated\n", pkg.version),
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
            let package = control.first_package().unwrap();
            let arch = control.architectures()[0];
            let file = format!("{package}_{version}_{arch}.deb");

            std::fs::write(dir.parent().unwrap().join(&file), "deb").unwrap();
            std::fs::write(debian.join("files"), format!("{file} misc optional\n")).unwrap();
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, invocation: &Invocation) -> Result<(), ToolError> {
            self.calls.lock().unwrap().push(invocation.clone());
            if self.fail_when.as_ref().is_some_and(|f| f(invocation)) {
                return Err(ToolError::Failed {
                    command: invocation.to_string(),
                    status: "exit status: 1".to_string(),
                });
            }

            let dir = invocation.cwd.clone().unwrap_or_else(|| PathBuf::from("."));
            match invocation.tool {
                Tool::Generator => Self::generate(invocation, &dir),
                Tool::ArtifactBuilder => Self::build(&dir),
                Tool::PackageManager | Tool::Sudo => {}
            }
            Ok(())
        }

        fn locate(&self, _tool: Tool, program: &str) -> Result<PathBuf, ToolError> {
            Ok(PathBuf::from("/usr/bin").join(program))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use crate::config::defaults::MIN_PROPTEST_ITERATIONS;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(MIN_PROPTEST_ITERATIONS))]

        #[test]
        fn test_module_name_generator(name in module_name()) {
            prop_assert!(name.len() >= 2);
            prop_assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
        }

        #[test]
        fn test_branch_name_generator(branch in branch_name()) {
            prop_assert!(!branch.is_empty());
            prop_assert!(!branch.contains('+'));
        }

        #[test]
        fn test_semver_version_generator(version in semver_version()) {
            prop_assert!(semver::Version::parse(&version).is_ok());
        }

        #[test]
        fn test_dag_generator_is_acyclic(graph in dag(8)) {
            for (i, deps) in graph.iter().enumerate() {
                prop_assert!(deps.iter().all(|d| *d < i));
            }
        }
    }
}
