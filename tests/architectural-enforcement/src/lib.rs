//! Architectural Enforcement Integration Tests
//!
//! This package holds source scans that keep the workspace honest:
//! - No blocking I/O inside async functions
//! - No sleeping in production code (reveal timing is tick driven)
//! - Rendering and prompt modules stay pure
//! - No `unwrap()` / `expect()` outside tests
//!
//! The helpers here are shared by the scans under `tests/`.

use std::fs;
use std::path::{Path, PathBuf};

/// Workspace root, two levels above this package
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

/// Every `.rs` file under `dir` (relative to the workspace root)
pub fn rust_files(dir: &str) -> Vec<PathBuf> {
    let root = workspace_root().join(dir);
    assert!(root.exists(), "missing source directory: {}", root.display());

    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect()
}

/// A production source line: 1-based number and code with comments removed
#[derive(Debug, Clone)]
pub struct SourceLine {
    /// Line number in the file
    pub number: usize,
    /// Code before any `//`
    pub code: String,
}

/// Production lines of `content`
///
/// Everything from the first `#[cfg(test)]` on is treated as test code.
pub fn production_lines(content: &str) -> Vec<SourceLine> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .map(|(idx, line)| SourceLine {
            number: idx + 1,
            code: line.split("//").next().unwrap_or(line).to_string(),
        })
        .collect()
}

/// Read a file's production lines, or nothing if unreadable
pub fn read_production_lines(path: &Path) -> Vec<SourceLine> {
    fs::read_to_string(path)
        .map(|content| production_lines(&content))
        .unwrap_or_default()
}

/// If `line` opens a function, whether that function is async
pub fn function_header(line: &str) -> Option<bool> {
    let trimmed = line.trim_start();
    let rest = trimmed
        .strip_prefix("pub(crate) ")
        .or_else(|| trimmed.strip_prefix("pub(super) "))
        .or_else(|| trimmed.strip_prefix("pub "))
        .unwrap_or(trimmed);

    if rest.starts_with("async fn ") {
        Some(true)
    } else if rest.starts_with("fn ") {
        Some(false)
    } else {
        None
    }
}

/// Whether the function enclosing `lines[idx]` is async
pub fn in_async_function(lines: &[SourceLine], idx: usize) -> bool {
    lines[..=idx]
        .iter()
        .rev()
        .find_map(|line| function_header(&line.code))
        .unwrap_or(false)
}

/// Format a violation for the report
pub fn violation(path: &Path, line: &SourceLine, what: &str) -> String {
    let relative = path.strip_prefix(workspace_root()).unwrap_or(path);
    format!(
        "{}:{} - {}: {}",
        relative.display(),
        line.number,
        what,
        line.code.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_header() {
        assert_eq!(function_header("pub async fn submit(&mut self) {"), Some(true));
        assert_eq!(function_header("    async fn send(&self) {"), Some(true));
        assert_eq!(function_header("pub fn open(path: &Path) {"), Some(false));
        assert_eq!(function_header("    pub(crate) fn build_body() {"), Some(false));
        assert_eq!(function_header("let f = 1;"), None);
    }

    #[test]
    fn test_async_detection() {
        let lines = production_lines(
            "async fn bad() {\n    let s = std::fs::read_to_string(\"x\");\n}\nfn good() {\n    std::fs::write(\"x\", \"y\");\n}",
        );
        assert!(in_async_function(&lines, 1));
        assert!(!in_async_function(&lines, 4));
    }

    #[test]
    fn test_test_code_is_skipped() {
        let lines = production_lines("fn a() {}\n#[cfg(test)]\nmod tests {\n    fn b() { x.unwrap(); }\n}");
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_comments_are_stripped() {
        let lines = production_lines("let a = 1; // std::fs::read");
        assert_eq!(lines[0].code.trim(), "let a = 1;");
    }
}
