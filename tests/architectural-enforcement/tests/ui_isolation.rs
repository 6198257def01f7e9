//! Integration Test: UI Isolation
//!
//! The core crate is headless orchestration logic. Rendering front-ends
//! depend on it, never the other way around, and the non-interactive output
//! path goes through flush events rather than direct printing.
//!
//! **Policy**: `stagehand/core` MUST NOT reference a terminal UI framework
//! and MUST NOT write to stdout/stderr itself.
//! **Exceptions**: test code (`#[cfg(test)]` modules and `tests/`).

use std::fs;
use std::path::{Path, PathBuf};

/// UI frameworks the core must never reference
const UI_FRAMEWORKS: &[&str] = &["ratatui", "crossterm", "termion", "cursive"];

/// Direct output macros the core must never call
const OUTPUT_MACROS: &[&str] = &["println!", "print!", "eprintln!", "eprint!", "dbg!"];

/// Test that the core crate has no UI-framework dependencies
#[test]
fn test_core_has_no_ui_framework_dependencies() {
    let manifest = core_dir().join("Cargo.toml");
    let content = fs::read_to_string(&manifest)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", manifest.display()));

    let mut violations = Vec::new();
    for framework in UI_FRAMEWORKS {
        for line in content.lines() {
            let code = line.split('#').next().unwrap_or(line);
            if code.contains(framework) {
                violations.push(format!("Cargo.toml declares '{framework}': {}", line.trim()));
            }
        }
    }

    report("UI framework dependencies found in the core crate!", &violations);
}

/// Test that core source never imports a UI framework
#[test]
fn test_core_source_never_imports_ui_frameworks() {
    let mut violations = Vec::new();

    for_each_core_source(|path, lines| {
        for (idx, line) in lines.iter().enumerate() {
            let code = line.split("//").next().unwrap_or(line);
            for framework in UI_FRAMEWORKS {
                if code.contains(&format!("{framework}::")) || code.contains(&format!("use {framework}"))
                {
                    violations.push(format!("{}:{}: {}", path.display(), idx + 1, line.trim()));
                }
            }
        }
    });

    report("UI framework imports found in core source!", &violations);
}

/// Test that core source never writes to stdout/stderr directly
#[test]
fn test_core_never_writes_to_stdout() {
    let mut violations = Vec::new();

    for_each_core_source(|path, lines| {
        let mut in_tests = false;
        for (idx, line) in lines.iter().enumerate() {
            // Everything below an inline test module is test code.
            if line.contains("#[cfg(test)]") {
                in_tests = true;
            }
            if in_tests {
                continue;
            }
            let code = line.split("//").next().unwrap_or(line);
            for output_macro in OUTPUT_MACROS {
                if code.contains(output_macro) {
                    violations.push(format!("{}:{}: {}", path.display(), idx + 1, line.trim()));
                }
            }
        }
    });

    report("Direct stdout/stderr writes found in core source!", &violations);
}

/// Resolve `stagehand/core` relative to this package's manifest
fn core_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("stagehand")
        .join("core")
}

/// Walk the core crate's production sources
fn for_each_core_source(mut check: impl FnMut(&Path, &[&str])) {
    let src = core_dir().join("src");
    assert!(src.exists(), "core source directory missing: {}", src.display());

    for entry in walkdir::WalkDir::new(&src).into_iter().filter_map(Result::ok) {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("rs") {
            continue;
        }
        let Ok(content) = fs::read_to_string(entry.path()) else {
            continue;
        };
        let lines: Vec<&str> = content.lines().collect();
        check(entry.path(), &lines);
    }
}

fn report(headline: &str, violations: &[String]) {
    if violations.is_empty() {
        return;
    }

    eprintln!("\nCRITICAL: {headline}");
    for violation in violations {
        eprintln!("  {violation}");
    }
    eprintln!("\nThe core must stay headless: rendering and printing belong to front-ends.");

    panic!(
        "\nFound {} architectural violation(s) in the core crate.\nFix these before merging!",
        violations.len()
    );
}
