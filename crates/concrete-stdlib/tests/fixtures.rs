mod common;

use common::run_captured;
use concrete_core::vm::HostValue;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What a fixture's first line says should happen
enum Expectation {
    Results(Vec<HostValue>),
    Error(String),
}

fn expectation(path: &Path, source: &str) -> Result<Expectation, String> {
    let first = source.lines().next().unwrap_or_default().trim();
    if let Some(json) = first.strip_prefix("// expect:") {
        return serde_json::from_str(json.trim())
            .map(Expectation::Results)
            .map_err(|e| format!("{}: bad expectation: {e}", path.display()));
    }
    if let Some(message) = first.strip_prefix("// expect-error:") {
        return Ok(Expectation::Error(message.trim().to_string()));
    }
    Err(format!(
        "{}: first line must be `// expect: <json>` or `// expect-error: <message>`",
        path.display()
    ))
}

#[test]
fn test_fixture_programs() {
    let fixtures_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");

    let mut files: Vec<PathBuf> = WalkDir::new(&fixtures_dir)
        .into_iter()
        .filter_map(Result::ok)
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("concrete"))
        .collect();
    files.sort();
    assert!(!files.is_empty(), "no fixtures under {}", fixtures_dir.display());

    let mut failures = Vec::new();

    for path in &files {
        let source = fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
            .replace("\r\n", "\n");

        let expected = match expectation(path, &source) {
            Ok(expected) => expected,
            Err(message) => {
                failures.push(message);
                continue;
            }
        };

        let name = path.strip_prefix(&fixtures_dir).unwrap_or(path).display();
        match (expected, run_captured(&source).results) {
            (Expectation::Results(want), Ok(got)) if want == got => {}
            (Expectation::Results(want), Ok(got)) => {
                failures.push(format!("❌ {name}: expected {want:?}, got {got:?}"));
            }
            (Expectation::Results(_), Err(e)) => {
                failures.push(format!("❌ {name}: failed with {}", e.format_display()));
            }
            (Expectation::Error(message), Err(e)) if e.format_display().contains(&message) => {}
            (Expectation::Error(message), Err(e)) => failures.push(format!(
                "❌ {name}: expected error containing '{message}', got '{}'",
                e.format_display()
            )),
            (Expectation::Error(message), Ok(got)) => failures.push(format!(
                "❌ {name}: expected error containing '{message}', got results {got:?}"
            )),
        }
    }

    if !failures.is_empty() {
        panic!(
            "{} of {} fixtures failed:\n{}",
            failures.len(),
            files.len(),
            failures.join("\n")
        );
    }
}
