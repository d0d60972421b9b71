//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: async functions in `core` and `cli` must not block the
//! runtime. Use `tokio::fs` and async HTTP, not `std::fs`, `std::net` or
//! `reqwest::blocking`.
//!
//! **Acceptable**: blocking calls in non-async functions (the file store
//! writes a small JSON file synchronously) and in test code.

use architectural_enforcement::{in_async_function, read_production_lines, rust_files, violation};

const BLOCKING_PATTERNS: &[(&str, &str)] = &[
    ("std::fs::", "Blocking file I/O"),
    ("std::net::", "Blocking network I/O"),
    ("std::process::Command", "Blocking process I/O"),
    ("std::thread::sleep", "Blocking sleep"),
];

#[test]
fn test_no_blocking_io_in_async_code() {
    let mut violations = Vec::new();

    for dir in ["core/src", "cli/src"] {
        for path in rust_files(dir) {
            let lines = read_production_lines(&path);
            for (idx, line) in lines.iter().enumerate() {
                if line.code.contains("reqwest::blocking") {
                    violations.push(violation(&path, line, "Blocking HTTP client"));
                }

                if !in_async_function(&lines, idx) {
                    continue;
                }

                for (pattern, what) in BLOCKING_PATTERNS {
                    if line.code.contains(pattern) {
                        violations.push(violation(&path, line, what));
                    }
                }
            }
        }
    }

    if !violations.is_empty() {
        eprintln!("\nBlocking I/O in async code:");
        for v in &violations {
            eprintln!("  {v}");
        }
        panic!("Found {} blocking I/O violation(s)", violations.len());
    }
}
