//! Debian metadata transforms
//!
//! Structured edits of the files the generator writes under `debian/`:
//!
//! - `control`: parsed into paragraphs of fields, rewritten, serialized
//! - `changelog`: only the first entry's header line is rewritten
//! - `rules`: gains no-op overrides for stripping and shlib scanning
//! - `files`: read back to learn the artifact file name
//! - `postinst`/`postrm`: hook fragments for data packages

use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::ControlError;

/// Targets appended to `debian/rules`
pub const RULES_OVERRIDES: &str = "\noverride_dh_strip:\n\ttrue\n\noverride_dh_shlibdeps:\n\ttrue\n";

/// First lines of a freshly created maintainer script
pub const HOOK_HEADER: &str = "#!/bin/sh\nset -e\n";

/// One line of a control paragraph
#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Field {
        name: String,
        value: String,
        continuation: Vec<String>,
    },
    Comment(String),
}

/// One paragraph (stanza) of a control file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    entries: Vec<Entry>,
}

impl Paragraph {
    /// Get the first-line value of a field (names are case-insensitive)
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find_map(|e| match e {
            Entry::Field { name, value, .. } if name.eq_ignore_ascii_case(key) => {
                Some(value.as_str())
            }
            _ => None,
        })
    }

    /// Replace the value of an existing field; returns whether it existed
    pub fn set(&mut self, key: &str, new_value: &str) -> bool {
        let mut found = false;
        for entry in &mut self.entries {
            if let Entry::Field { name, value, continuation } = entry {
                if name.eq_ignore_ascii_case(key) {
                    *value = new_value.to_string();
                    continuation.clear();
                    found = true;
                }
            }
        }
        found
    }

    fn prefix(&mut self, key: &str, prefix: &str) {
        if let Some(current) = self.get(key).map(str::to_string) {
            self.set(key, &format!("{prefix}-{current}"));
        }
    }
}

impl fmt::Display for Paragraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            match entry {
                Entry::Field { name, value, continuation } => {
                    if value.is_empty() {
                        writeln!(f, "{name}:")?;
                    } else {
                        writeln!(f, "{name}: {value}")?;
                    }
                    for line in continuation {
                        writeln!(f, "{line}")?;
                    }
                }
                Entry::Comment(line) => writeln!(f, "{line}")?,
            }
        }
        Ok(())
    }
}

/// A parsed `debian/control` file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlFile {
    paragraphs: Vec<Paragraph>,
}

impl ControlFile {
    /// Parse control file text
    pub fn parse(content: &str) -> Result<Self, ControlError> {
        let mut paragraphs = Vec::new();
        let mut current = Paragraph::default();

        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;

            if line.trim().is_empty() {
                if !current.entries.is_empty() {
                    paragraphs.push(std::mem::take(&mut current));
                }
                continue;
            }

            if line.starts_with('#') {
                current.entries.push(Entry::Comment(line.to_string()));
                continue;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                match current.entries.iter_mut().rev().find_map(|e| match e {
                    Entry::Field { continuation, .. } => Some(continuation),
                    Entry::Comment(_) => None,
                }) {
                    Some(continuation) => continuation.push(line.to_string()),
                    None => return Err(ControlError::OrphanContinuation { line: line_no }),
                }
                continue;
            }

            let Some((name, value)) = line.split_once(':') else {
                return Err(ControlError::MalformedField {
                    line: line_no,
                    content: line.to_string(),
                });
            };
            current.entries.push(Entry::Field {
                name: name.trim().to_string(),
                value: value.trim().to_string(),
                continuation: Vec::new(),
            });
        }

        if !current.entries.is_empty() {
            paragraphs.push(current);
        }

        Ok(Self { paragraphs })
    }

    /// All paragraphs, source paragraph first
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// The `Source` field of the source paragraph
    pub fn source(&self) -> Option<&str> {
        self.paragraphs.iter().find_map(|p| p.get("Source"))
    }

    /// The `Package` fields of all binary paragraphs
    pub fn packages(&self) -> Vec<&str> {
        self.paragraphs.iter().filter_map(|p| p.get("Package")).collect()
    }

    /// The first binary package name
    pub fn first_package(&self) -> Result<&str, ControlError> {
        self.packages()
            .first()
            .copied()
            .ok_or_else(|| ControlError::MissingField {
                field: "Package".to_string(),
            })
    }

    /// Architectures of all binary paragraphs
    pub fn architectures(&self) -> Vec<&str> {
        self.paragraphs
            .iter()
            .filter_map(|p| p.get("Architecture"))
            .collect()
    }

    /// Prefix `Source` and every `Package` with `<prefix>-`
    pub fn apply_prefix(&mut self, prefix: &str) -> Result<(), ControlError> {
        if self.source().is_none() {
            return Err(ControlError::MissingField {
                field: "Source".to_string(),
            });
        }
        self.first_package()?;

        for paragraph in &mut self.paragraphs {
            paragraph.prefix("Source", prefix);
            paragraph.prefix("Package", prefix);
        }
        Ok(())
    }

    /// Set `Architecture` on every paragraph that declares one
    pub fn set_architecture(&mut self, arch: &str) {
        for paragraph in &mut self.paragraphs {
            paragraph.set("Architecture", arch);
        }
    }
}

impl fmt::Display for ControlFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, paragraph) in self.paragraphs.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{paragraph}")?;
        }
        Ok(())
    }
}

fn changelog_header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\S+) \(").expect("valid regex"))
}

/// Prefix the package name of the first changelog entry
///
/// Later entries are left untouched.
pub fn prefix_changelog(content: &str, prefix: &str) -> Result<String, ControlError> {
    let (first, rest) = match content.split_once('\n') {
        Some((first, rest)) => (first, Some(rest)),
        None => (content, None),
    };
    if first.trim().is_empty() {
        return Err(ControlError::EmptyChangelog);
    }
    if !changelog_header_regex().is_match(first) {
        return Err(ControlError::MalformedField {
            line: 1,
            content: first.to_string(),
        });
    }

    let header = changelog_header_regex().replace(first, format!("{prefix}-$1 (").as_str());
    Ok(match rest {
        Some(rest) => format!("{header}\n{rest}"),
        None => header.into_owned(),
    })
}

/// Read the artifact file name from `debian/files`
///
/// The first token of the first entry names the built artifact.
pub fn parse_artifact_record(content: &str) -> Result<String, ControlError> {
    content
        .lines()
        .find_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .ok_or(ControlError::EmptyArtifactRecord)
}

/// Namespace directory name derived from an artifact prefix
pub fn namespace_for(prefix: &str) -> String {
    prefix.replace('-', "_")
}

/// Add a fragment to an existing maintainer script
///
/// The fragment lands in front of a final `exit 0` line, or at the end when
/// the script has none.
pub fn insert_hook_fragment(script: &str, fragment: &str) -> String {
    let trimmed = script.trim_end();
    let last_start = trimmed.rfind('\n').map_or(0, |i| i + 1);
    let last_line = &trimmed[last_start..];

    if last_line.trim() == "exit 0" {
        let mut out = trimmed[..last_start].to_string();
        out.push_str(fragment);
        if !fragment.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(last_line);
        out.push('\n');
        out
    } else {
        let mut out = script.to_string();
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(fragment);
        out
    }
}

/// Maintainer hooks that move a data package's installed interface code
/// into a namespace directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataHooks {
    include_root: PathBuf,
    python_root: PathBuf,
    module: String,
    namespace: String,
}

impl DataHooks {
    /// Hooks for `module` installed under `ros_root`
    pub fn new(ros_root: &Path, module: &str, prefix: &str) -> Self {
        Self {
            include_root: ros_root.join("include"),
            python_root: ros_root.join("lib").join("python3").join("dist-packages"),
            module: module.to_string(),
            namespace: namespace_for(prefix),
        }
    }

    fn include_target(&self) -> PathBuf {
        self.include_root.join(&self.namespace).join(&self.module)
    }

    fn python_target(&self) -> PathBuf {
        self.python_root.join(&self.namespace).join(&self.module)
    }

    /// Fragment appended to `debian/postinst`
    pub fn postinst(&self) -> String {
        let include_ns = self.include_root.join(&self.namespace);
        let python_ns = self.python_root.join(&self.namespace);
        let include_src = self.include_root.join(&self.module);
        let python_src = self.python_root.join(&self.module);
        let include_dst = self.include_target();
        let python_dst = self.python_target();

        let mut script = String::new();
        script.push_str(&format!("mkdir -p {}\n", include_ns.display()));
        script.push_str(&format!("mkdir -p {}\n", python_ns.display()));
        for (src, dst) in [(&include_src, &include_dst), (&python_src, &python_dst)] {
            script.push_str(&format!(
                "if [ -d {src} ]; then\n    echo Installing directory: {dst}\n    rm -rf {dst}\n    cp -r {src} {dst}\nfi\n",
                src = src.display(),
                dst = dst.display(),
            ));
        }
        script.push_str(&format!("touch {}\n", python_ns.join("__init__.py").display()));
        script
    }

    /// Fragment appended to `debian/postrm`
    pub fn postrm(&self) -> String {
        format!(
            "\n_PATH_INCLUDE_PKG={}\n_PATH_PYTHON3_PKG={}\ncase \"$1\" in\n    remove|purge)\n        rm -rf \"$_PATH_INCLUDE_PKG\" \"$_PATH_PYTHON3_PKG\"\n        ;;\nesac\n",
            self.include_target().display(),
            self.python_target().display(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTROL: &str = "\
Source: ros-noetic-arm-msgs
Section: misc
Priority: optional
Maintainer: Dev <dev@example.com>
Build-Depends: debhelper (>= 9.0.0), ros-noetic-catkin,
 ros-noetic-message-generation
Homepage:
Standards-Version: 3.9.2

Package: ros-noetic-arm-msgs
Architecture: any
Depends: ${shlibs:Depends}, ${misc:Depends}
Description: Arm messages
 Message definitions for the arm.
";

    const CHANGELOG: &str = "\
ros-noetic-arm-msgs (1.2.0-0focal) focal; urgency=high

  * Autogenerated

 -- Dev <dev@example.com>  Mon, 01 Jan 2024 00:00:00 +0000

ros-noetic-arm-msgs (1.1.0-0focal) focal; urgency=high
";

    #[test]
    fn test_parse_paragraphs() {
        let control = ControlFile::parse(CONTROL).unwrap();
        assert_eq!(control.paragraphs().len(), 2);
        assert_eq!(control.source(), Some("ros-noetic-arm-msgs"));
        assert_eq!(control.packages(), vec!["ros-noetic-arm-msgs"]);
        assert_eq!(control.architectures(), vec!["any"]);
    }

    #[test]
    fn test_unchanged_control_roundtrips() {
        let control = ControlFile::parse(CONTROL).unwrap();
        let reparsed = ControlFile::parse(&control.to_string()).unwrap();
        assert_eq!(control, reparsed);
        assert!(control.to_string().contains(" ros-noetic-message-generation\n"));
    }

    #[test]
    fn test_apply_prefix_rewrites_source_and_package() {
        let mut control = ControlFile::parse(CONTROL).unwrap();
        control.apply_prefix("zj-humanoid").unwrap();

        assert_eq!(control.source(), Some("zj-humanoid-ros-noetic-arm-msgs"));
        assert_eq!(control.first_package().unwrap(), "zj-humanoid-ros-noetic-arm-msgs");
        // Dependencies are not package declarations
        assert!(control.to_string().contains("Build-Depends: debhelper (>= 9.0.0), ros-noetic-catkin,"));
    }

    #[test]
    fn test_apply_prefix_requires_fields() {
        let mut control = ControlFile::parse("Package: a\nArchitecture: any\n").unwrap();
        assert_eq!(
            control.apply_prefix("p"),
            Err(ControlError::MissingField {
                field: "Source".to_string()
            })
        );
    }

    #[test]
    fn test_set_architecture_only_touches_binary_paragraphs() {
        let mut control = ControlFile::parse(CONTROL).unwrap();
        control.set_architecture("all");

        assert_eq!(control.architectures(), vec!["all"]);
        assert!(control.paragraphs()[0].get("Architecture").is_none());
    }

    #[test]
    fn test_parse_rejects_orphan_continuation() {
        let err = ControlFile::parse(" continued\nSource: a\n").unwrap_err();
        assert_eq!(err, ControlError::OrphanContinuation { line: 1 });
    }

    #[test]
    fn test_parse_rejects_malformed_line() {
        let err = ControlFile::parse("Source: a\nnot a field\n").unwrap_err();
        assert!(matches!(err, ControlError::MalformedField { line: 2, .. }));
    }

    #[test]
    fn test_prefix_changelog_first_entry_only() {
        let patched = prefix_changelog(CHANGELOG, "zj-humanoid").unwrap();
        let mut lines = patched.lines();

        assert_eq!(
            lines.next(),
            Some("zj-humanoid-ros-noetic-arm-msgs (1.2.0-0focal) focal; urgency=high")
        );
        assert!(patched.contains("\nros-noetic-arm-msgs (1.1.0-0focal)"));
        assert!(patched.ends_with('\n'));
    }

    #[test]
    fn test_prefix_changelog_rejects_empty() {
        assert_eq!(prefix_changelog("", "p"), Err(ControlError::EmptyChangelog));
        assert!(matches!(
            prefix_changelog("garbage\n", "p"),
            Err(ControlError::MalformedField { line: 1, .. })
        ));
    }

    #[test]
    fn test_parse_artifact_record() {
        let record = "zj-humanoid-ros-noetic-arm-msgs_1.2.0-0focal_all.deb misc optional\n";
        assert_eq!(
            parse_artifact_record(record).unwrap(),
            "zj-humanoid-ros-noetic-arm-msgs_1.2.0-0focal_all.deb"
        );
        assert_eq!(parse_artifact_record("\n"), Err(ControlError::EmptyArtifactRecord));
    }

    #[test]
    fn test_hook_fragment_goes_before_exit() {
        let script = "#!/bin/sh\nset -e\n\n#DEBHELPER#\n\nexit 0\n";
        let patched = insert_hook_fragment(script, "touch /tmp/x\n");

        assert_eq!(patched, "#!/bin/sh\nset -e\n\n#DEBHELPER#\n\ntouch /tmp/x\nexit 0\n");
    }

    #[test]
    fn test_hook_fragment_appended_without_exit() {
        let patched = insert_hook_fragment("#!/bin/sh\necho hi", "touch /tmp/x\n");
        assert_eq!(patched, "#!/bin/sh\necho hi\ntouch /tmp/x\n");
    }

    #[test]
    fn test_namespace_for_prefix() {
        assert_eq!(namespace_for("zj-humanoid"), "zj_humanoid");
    }

    #[test]
    fn test_data_hooks_paths() {
        let hooks = DataHooks::new(Path::new("/opt/ros/noetic"), "arm_msgs", "zj-humanoid");

        let postinst = hooks.postinst();
        assert!(postinst.contains("mkdir -p /opt/ros/noetic/include/zj_humanoid\n"));
        assert!(postinst.contains(
            "cp -r /opt/ros/noetic/include/arm_msgs /opt/ros/noetic/include/zj_humanoid/arm_msgs"
        ));
        assert!(postinst.contains(
            "touch /opt/ros/noetic/lib/python3/dist-packages/zj_humanoid/__init__.py"
        ));

        let postrm = hooks.postrm();
        assert!(postrm.contains("_PATH_INCLUDE_PKG=/opt/ros/noetic/include/zj_humanoid/arm_msgs"));
        assert!(postrm.contains(
            "_PATH_PYTHON3_PKG=/opt/ros/noetic/lib/python3/dist-packages/zj_humanoid/arm_msgs"
        ));
    }
}
