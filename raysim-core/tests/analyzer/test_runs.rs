//! Analyzer tests for the run directive

use super::{analyze, has_error};

#[test]
fn test_two_runs() {
    let diagnostics = analyze("source s\nmonitor m\nrun rays=1\nrun rays=2\n");
    assert!(has_error(&diagnostics, "more than one run directive"));
}

#[test]
fn test_unknown_run_setting() {
    let diagnostics = analyze("source s\nmonitor m\nrun rays=10 threads=4\n");
    assert!(has_error(&diagnostics, "unknown run setting 'threads'"));
}

#[test]
fn test_run_setting_uses_let() {
    let diagnostics = analyze("let n = 100\nsource s\nmonitor m\nrun rays=n * 2 seed=1\n");
    assert!(!diagnostics.has_errors(), "{}", diagnostics);
}

#[test]
fn test_run_setting_vector() {
    let diagnostics = analyze("source s\nmonitor m\nrun seed=(1, 2, 3)\n");
    assert!(has_error(&diagnostics, "expects a single number"));
}
