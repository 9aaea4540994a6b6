//! Parser tests for the run directive

use raysim_core::ast::{AttrValue, Expr};
use raysim_core::parse_instrument;

#[test]
fn test_run_directive() {
    let instrument = parse_instrument("source s\nrun rays=500 seed=3\n").unwrap();
    assert_eq!(instrument.runs.len(), 1);
    let run = &instrument.runs[0];
    assert_eq!(run.attributes.len(), 2);
    assert_eq!(run.attributes[0].key, "rays");
    assert_eq!(run.attributes[0].value, AttrValue::Scalar(Expr::Literal(500.0)));
}

#[test]
fn test_bare_run() {
    let instrument = parse_instrument("run\n").unwrap();
    assert_eq!(instrument.runs.len(), 1);
    assert!(instrument.runs[0].attributes.is_empty());
}

#[test]
fn test_runner_is_a_component_kind() {
    // only the exact word `run` starts a directive
    let instrument = parse_instrument("runner r1\n").unwrap();
    assert!(instrument.runs.is_empty());
    assert_eq!(instrument.components[0].kind, "runner");
}
