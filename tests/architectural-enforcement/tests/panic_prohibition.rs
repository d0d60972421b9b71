//! Integration Test: Panic Prohibition
//!
//! **Policy**: production code propagates errors. `unwrap()`, `expect()`,
//! `panic!` and `todo!` are allowed in tests only.

use architectural_enforcement::{read_production_lines, rust_files, violation};

const PANICKING: &[(&str, &str)] = &[
    (".unwrap()", "unwrap"),
    (".expect(", "expect"),
    ("panic!(", "panic"),
    ("todo!(", "todo"),
    ("unimplemented!(", "unimplemented"),
];

#[test]
fn test_no_panics_in_production_code() {
    let mut violations = Vec::new();

    for dir in ["core/src", "cli/src"] {
        for path in rust_files(dir) {
            for line in read_production_lines(&path) {
                for (pattern, what) in PANICKING {
                    if line.code.contains(pattern) {
                        violations.push(violation(&path, &line, what));
                    }
                }
            }
        }
    }

    if !violations.is_empty() {
        eprintln!("\nPanicking calls in production code:");
        for v in &violations {
            eprintln!("  {v}");
        }
        panic!("Found {} panic violation(s)", violations.len());
    }
}
