//! `package.xml` parsing
//!
//! Extracts the fields the build pipeline needs from a ROS package
//! manifest: name, version, and its build and run dependencies.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Tags a package needs present while it builds
pub const BUILD_DEPENDENCY_TAGS: &[&str] = &["depend", "build_depend", "buildtool_depend", "test_depend"];

/// Tags a package needs present once installed
pub const RUN_DEPENDENCY_TAGS: &[&str] = &["depend", "exec_depend", "run_depend", "build_export_depend"];

/// Parsed contents of a `package.xml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageXml {
    /// Package name
    pub name: String,
    /// Declared version
    pub version: String,
    /// Dependencies needed to build the package
    pub build_dependencies: BTreeSet<String>,
    /// Dependencies needed by the installed package
    pub run_dependencies: BTreeSet<String>,
}

fn comment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"))
}

fn element_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<([a-z_]+)(?:\s[^>]*)?>\s*([^<]*?)\s*</([a-z_]+)>").expect("valid regex")
    })
}

impl PackageXml {
    /// Parse manifest text
    ///
    /// Returns an error message naming the missing element.
    pub fn parse(content: &str) -> Result<Self, String> {
        let content = comment_regex().replace_all(content, "");

        let mut name = None;
        let mut version = None;
        let mut build_dependencies = BTreeSet::new();
        let mut run_dependencies = BTreeSet::new();

        for caps in element_regex().captures_iter(&content) {
            let (tag, value, close) = (&caps[1], &caps[2], &caps[3]);
            if tag != close || value.is_empty() {
                continue;
            }
            match tag {
                "name" if name.is_none() => name = Some(value.to_string()),
                "version" if version.is_none() => version = Some(value.to_string()),
                "name" | "version" => {}
                t => {
                    if BUILD_DEPENDENCY_TAGS.contains(&t) {
                        build_dependencies.insert(value.to_string());
                    }
                    if RUN_DEPENDENCY_TAGS.contains(&t) {
                        run_dependencies.insert(value.to_string());
                    }
                }
            }
        }

        let name = name.ok_or_else(|| "missing <name> element".to_string())?;
        let version = version.ok_or_else(|| "missing <version> element".to_string())?;
        build_dependencies.remove(&name);
        run_dependencies.remove(&name);

        Ok(Self {
            name,
            version,
            build_dependencies,
            run_dependencies,
        })
    }

    /// Whether the version is plain `MAJOR.MINOR.PATCH`
    pub fn has_canonical_version(&self) -> bool {
        semver::Version::parse(&self.version)
            .map(|v| v.pre.is_empty() && v.build.is_empty())
            .unwrap_or(false)
    }
}
