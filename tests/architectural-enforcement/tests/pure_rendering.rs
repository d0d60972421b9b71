//! Integration Test: Pure Rendering and Prompt Modules
//!
//! **Policy**: the modules that turn text into display segments, split
//! directives, compose prompts and drive the reveal are pure functions of
//! their inputs. They never touch the filesystem, the environment, the
//! network or the store, and never spawn tasks.

use architectural_enforcement::{read_production_lines, workspace_root, violation};

const PURE_MODULES: &[&str] = &[
    "core/src/script.rs",
    "core/src/reading.rs",
    "core/src/furigana.rs",
    "core/src/directive.rs",
    "core/src/expression.rs",
    "core/src/prompt.rs",
    "core/src/conversation.rs",
    "core/src/reveal.rs",
    "core/src/render.rs",
];

const FORBIDDEN: &[(&str, &str)] = &[
    ("std::fs", "Filesystem access"),
    ("tokio::fs", "Filesystem access"),
    ("std::env", "Environment access"),
    ("reqwest", "Network access"),
    ("crate::store", "Store access"),
    ("tokio::spawn", "Task spawning"),
    ("Instant::now", "Clock access"),
];

#[test]
fn test_pure_modules_have_no_side_effects() {
    let mut violations = Vec::new();

    for module in PURE_MODULES {
        let path = workspace_root().join(module);
        assert!(path.exists(), "missing module: {module}");

        for line in read_production_lines(&path) {
            for (pattern, what) in FORBIDDEN {
                if line.code.contains(pattern) {
                    violations.push(violation(&path, &line, what));
                }
            }
        }
    }

    if !violations.is_empty() {
        eprintln!("\nSide effects in pure modules:");
        for v in &violations {
            eprintln!("  {v}");
        }
        panic!("Found {} purity violation(s)", violations.len());
    }
}
