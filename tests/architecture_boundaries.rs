use std::fs;
use std::path::{Path, PathBuf};

fn rs_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|s| s.to_str()) == Some("rs") {
                out.push(path);
            }
        }
    }
    out.sort();
    out
}

fn rel(path: &Path) -> String {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let rel = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string();
    rel.replace('\\', "/")
}

fn scan(dir: &str, forbidden: &[&str]) -> Vec<String> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join(dir);
    let mut violations = Vec::new();

    for file in rs_files(&root) {
        let content = fs::read_to_string(&file).unwrap_or_default();
        for needle in forbidden {
            if content.contains(needle) {
                violations.push(format!(
                    "{} imports forbidden dependency `{}`",
                    rel(&file),
                    needle
                ));
            }
        }
    }
    violations
}

#[test]
fn system_sources_know_nothing_of_presentation() {
    let violations = scan(
        "src/system",
        &["crate::ui", "crate::app", "crate::pipeline", "crossterm"],
    );

    assert!(
        violations.is_empty(),
        "System layering violations:\n{}",
        violations.join("\n")
    );
}

#[test]
fn ui_builds_frames_from_data_only() {
    let violations = scan(
        "src/ui",
        &["crate::pipeline", "crate::app", "crate::event", "tokio"],
    );

    assert!(
        violations.is_empty(),
        "UI boundary violations:\n{}",
        violations.join("\n")
    );
}

#[test]
fn pipeline_does_not_render() {
    let violations = scan("src/pipeline", &["crate::ui", "crate::app", "crossterm"]);

    assert!(
        violations.is_empty(),
        "Pipeline boundary violations:\n{}",
        violations.join("\n")
    );
}

#[test]
fn only_main_touches_process_exit() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    let mut violations = Vec::new();

    for file in rs_files(&root) {
        let rel_path = rel(&file);
        if rel_path == "src/main.rs" {
            continue;
        }
        let content = fs::read_to_string(&file).unwrap_or_default();
        if content.contains("std::process::exit") || content.contains("ExitCode") {
            violations.push(format!("{rel_path} decides the exit status"));
        }
    }

    assert!(
        violations.is_empty(),
        "Exit status handled outside main:\n{}",
        violations.join("\n")
    );
}
