//! File-matching collaborator for conditional rules.
//!
//! Conditional rules activate on presence only: the resolver asks
//! whether at least one file under the project root matches a glob, and
//! the walk stops at the first hit.

use std::path::Path;

use glob::Pattern;
use tracing::warn;
use walkdir::WalkDir;

/// Directory names never descended into while matching.
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "target",
    "dist",
    "build",
    "vendor",
    "__pycache__",
    ".venv",
    "venv",
];

/// Answers "does at least one file in the project match this glob".
pub trait FileMatcher {
    fn has_match(&self, root: &Path, pattern: &str) -> bool;
}

/// Walkdir-backed matcher with the standard directory denylist.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkMatcher;

impl FileMatcher for WalkMatcher {
    fn has_match(&self, root: &Path, pattern: &str) -> bool {
        let compiled = match Pattern::new(pattern) {
            Ok(p) => p,
            Err(err) => {
                warn!(pattern, %err, "invalid conditional glob, rule skipped");
                return false;
            }
        };

        WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                entry
                    .file_name()
                    .to_str()
                    .is_none_or(|name| !EXCLUDED_DIRS.contains(&name))
            })
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .any(|entry| {
                entry
                    .path()
                    .strip_prefix(root)
                    .map(|rel| compiled.matches_path(rel))
                    .unwrap_or(false)
            })
    }
}
