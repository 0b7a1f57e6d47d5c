//! Output formatting and progress indicators
//!
//! This module provides utilities for displaying progress bars and
//! formatted messages to the user.

use indicatif::{ProgressBar, ProgressStyle};

use crate::core::manifest::RunManifest;

/// Create a progress bar for build steps
pub fn create_build_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} modules ({msg})")
            .expect("Invalid progress bar template")
            .progress_chars("█▓▒░"),
    );
    pb
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";
}

/// Print a fatal error and its causes to stderr
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}

/// Render the outcome of a run
pub fn format_summary(manifest: &RunManifest) -> String {
    if manifest.modules.is_empty() {
        return format!("{} No modules to package", status::WARNING);
    }

    let mut out = format!(
        "{} Packaged {} modules ({}+{}-{})\n",
        status::SUCCESS,
        manifest.modules.len(),
        manifest.branch_label,
        manifest.commit_count,
        manifest.commit_hash
    );
    for module in &manifest.modules {
        let artifact = module
            .artifact_path
            .as_ref()
            .map_or_else(|| "-".to_string(), |p| p.display().to_string());
        out.push_str(&format!("  {} {artifact}\n", module.name));
    }
    out
}
