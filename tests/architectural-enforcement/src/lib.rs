//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - No sleep() calls in the animation core (timers compare clock readings)
//! - No mutable globals (all state is threaded through the rig)
//! - The core stays free of async runtimes
//!
//! The helpers here walk the workspace's Rust sources and strip comments and
//! test modules so each check only sees production code.

use std::fs;
use std::path::{Path, PathBuf};

/// Workspace root, resolved from this crate's manifest directory
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

/// A production source line
#[derive(Clone, Debug)]
pub struct SourceLine {
    /// File the line came from
    pub path: PathBuf,
    /// 1-based line number
    pub number: usize,
    /// The line with any `//` comment removed
    pub code: String,
}

impl std::fmt::Display for SourceLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.number, self.code.trim())
    }
}

/// All `.rs` files under `dir` (relative to the workspace root)
#[must_use]
pub fn rust_sources(dir: &str) -> Vec<PathBuf> {
    let root = workspace_root().join(dir);
    if !root.exists() {
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Strip a trailing `//` comment
#[must_use]
pub fn code_part(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

/// Production lines of every source under `dir`
///
/// Doc and line comments are stripped, and everything from a
/// `#[cfg(test)]` attribute to the end of the file is skipped; test modules
/// sit at the bottom of each file in this workspace.
#[must_use]
pub fn production_lines(dir: &str) -> Vec<SourceLine> {
    let mut lines = Vec::new();
    for path in rust_sources(dir) {
        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };
        for (idx, line) in content.lines().enumerate() {
            if line.trim_start().starts_with("#[cfg(test)]") {
                break;
            }
            let code = code_part(line);
            if code.trim().is_empty() {
                continue;
            }
            lines.push(SourceLine {
                path: path.clone(),
                number: idx + 1,
                code: code.to_string(),
            });
        }
    }
    lines
}

/// Production lines under `dir` containing any of `patterns`
#[must_use]
pub fn find_violations(dir: &str, patterns: &[&str]) -> Vec<SourceLine> {
    production_lines(dir)
        .into_iter()
        .filter(|line| patterns.iter().any(|p| line.code.contains(p)))
        .collect()
}

/// Print violations and fail the test
///
/// # Panics
///
/// Panics when `violations` is non-empty.
pub fn assert_clean(violations: &[SourceLine], rule: &str) {
    if violations.is_empty() {
        return;
    }
    eprintln!("\n❌ {rule}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    panic!("\nFound {} violation(s): {rule}", violations.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_part_strips_comments() {
        assert_eq!(code_part("let x = 1; // sleep(1)"), "let x = 1; ");
        assert_eq!(code_part("/// doc"), "");
    }

    #[test]
    fn test_core_sources_are_found() {
        let files = rust_sources("face/core/src");
        assert!(files.iter().any(|p| p.ends_with("rig.rs")));
    }

    #[test]
    fn test_production_lines_skip_test_modules() {
        let lines = production_lines("face/core/src");
        assert!(!lines.is_empty());
        assert!(lines.iter().all(|l| !l.code.contains("mod tests")));
    }
}
