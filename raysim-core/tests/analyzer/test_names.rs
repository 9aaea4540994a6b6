//! Analyzer tests for names and references

use super::{analyze, has_error};

#[test]
fn test_duplicate_component_name() {
    let diagnostics = analyze(
        r#"
source a
monitor a position=(0, 0, 1)
"#,
    );
    assert!(diagnostics.has_errors());
    assert!(has_error(&diagnostics, "duplicate component name 'a'"));
}

#[test]
fn test_duplicate_let() {
    let diagnostics = analyze(
        r#"
let d = 1
let d = 2
source s
monitor m
"#,
    );
    assert!(has_error(&diagnostics, "duplicate let binding 'd'"));
}

#[test]
fn test_let_uses_later_binding() {
    let diagnostics = analyze(
        r#"
let a = b + 1
let b = 2
source s
monitor m
"#,
    );
    assert!(has_error(&diagnostics, "unknown variable 'b' in let binding 'a'"));
}

#[test]
fn test_unknown_relative() {
    let diagnostics = analyze(
        r#"
source s
monitor m relative=ghost
"#,
    );
    assert!(has_error(&diagnostics, "unknown component 'ghost'"));
}

#[test]
fn test_forward_relative() {
    let diagnostics = analyze(
        r#"
source s
monitor m relative=later
arm later
"#,
    );
    assert!(has_error(&diagnostics, "not declared before it"));
}

#[test]
fn test_relative_to_self() {
    let diagnostics = analyze(
        r#"
source s
monitor m relative=m
"#,
    );
    assert!(has_error(&diagnostics, "not declared before it"));
}

#[test]
fn test_relative_must_be_a_name() {
    let diagnostics = analyze(
        r#"
source s
monitor m relative=(0, 0, 1)
"#,
    );
    assert!(has_error(&diagnostics, "must name a component"));
}

#[test]
fn test_unknown_variable_in_parameter() {
    let diagnostics = analyze(
        r#"
source s
monitor m position=(0, 0, distance)
"#,
    );
    assert!(has_error(&diagnostics, "unknown variable 'distance' in 'm'"));
}
