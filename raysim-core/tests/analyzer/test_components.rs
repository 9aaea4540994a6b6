//! Analyzer tests for component kinds and parameters

use super::{analyze, has_error};

#[test]
fn test_unknown_kind() {
    let diagnostics = analyze(
        r#"
source s
lens l
monitor m
"#,
    );
    assert!(has_error(&diagnostics, "unknown component kind 'lens'"));
}

#[test]
fn test_parameter_not_valid_for_kind() {
    let diagnostics = analyze(
        r#"
source s
mirror m length=2
monitor det
"#,
    );
    assert!(has_error(&diagnostics, "parameter 'length' does not apply to mirror 'm'"));
}

#[test]
fn test_sampling_only_on_source() {
    let diagnostics = analyze(
        r#"
source s sampling=cap
monitor m sampling=cap
"#,
    );
    let errors: Vec<_> = diagnostics.errors().collect();
    assert_eq!(errors.len(), 1, "{:?}", errors);
    assert!(errors[0].message.contains("'sampling' does not apply to monitor 'm'"));
}

#[test]
fn test_unknown_sampling_mode() {
    let diagnostics = analyze("source s sampling=gaussian\nmonitor m\n");
    assert!(has_error(&diagnostics, "must be 'additive' or 'cap'"));
}

#[test]
fn test_duplicate_parameter() {
    let diagnostics = analyze("source s width=1 width=2\nmonitor m\n");
    assert!(has_error(&diagnostics, "duplicate parameter 'width' on 's'"));
}

#[test]
fn test_vector_and_scalar_shapes() {
    let diagnostics = analyze(
        r#"
source s normal=1
monitor m width=(1, 2, 3)
"#,
    );
    assert!(has_error(&diagnostics, "'normal' on 's' expects a vector"));
    assert!(has_error(&diagnostics, "'width' on 'm' expects a single number"));
}

#[test]
fn test_source_must_come_first() {
    let diagnostics = analyze(
        r#"
arm origin
guide g
monitor m
"#,
    );
    assert!(has_error(&diagnostics, "rays need a source before it"));
}

#[test]
fn test_arm_before_source_is_fine() {
    let diagnostics = analyze(
        r#"
arm origin position=(1, 0, 0)
source s relative=origin
monitor m
"#,
    );
    assert!(!diagnostics.has_errors(), "{}", diagnostics);
}

#[test]
fn test_empty_instrument() {
    let diagnostics = analyze("# nothing here\n");
    assert!(has_error(&diagnostics, "declares no components"));
}

#[test]
fn test_missing_monitor_is_a_warning() {
    let diagnostics = analyze("source s\npropagator p\n");
    assert!(!diagnostics.has_errors());
    assert!(diagnostics
        .warnings()
        .any(|w| w.message.contains("no monitor")));
}
