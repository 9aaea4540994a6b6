//! Parser tests for component lines

use raysim_core::ast::{AttrValue, Expr};
use raysim_core::parse_instrument;

#[test]
fn test_component_with_attributes() {
    let source = r#"
source src width=0.1 height=0.1 spread=3
guide guide width=0.07 height=0.07 length=4 position=(0, 0, 0.25)
"#;
    let result = parse_instrument(source);
    assert!(result.is_ok(), "Failed to parse: {:?}", result.err());

    let instrument = result.unwrap();
    assert_eq!(instrument.components.len(), 2);
    let guide = &instrument.components[1];
    assert_eq!(guide.kind, "guide");
    assert_eq!(guide.name, "guide");
    assert_eq!(guide.attributes.len(), 4);
    match &guide.attribute("position").unwrap().value {
        AttrValue::Vector([x, _, z]) => {
            assert_eq!(*x, Expr::Literal(0.0));
            assert_eq!(*z, Expr::Literal(0.25));
        }
        other => panic!("Expected vector, got {:?}", other),
    }
}

#[test]
fn test_component_without_attributes() {
    let instrument = parse_instrument("arm pivot\n").unwrap();
    assert_eq!(instrument.components[0].kind, "arm");
    assert_eq!(instrument.components[0].name, "pivot");
    assert!(instrument.components[0].attributes.is_empty());
}

#[test]
fn test_relative_and_sampling_are_symbols() {
    let source = r#"
source src sampling=cap
monitor det relative=src
"#;
    let instrument = parse_instrument(source).unwrap();
    assert_eq!(instrument.components[1].relative(), Some("src"));
    assert_eq!(
        instrument.components[0].attribute("sampling").unwrap().value,
        AttrValue::Scalar(Expr::Var("cap".to_string()))
    );
}

#[test]
fn test_comments_and_blank_lines() {
    let source = r#"
# leading comment

source src   # trailing comment
   monitor   det    width=0.2
"#;
    let instrument = parse_instrument(source).unwrap();
    assert_eq!(instrument.components.len(), 2);
    assert_eq!(instrument.components[1].attributes.len(), 1);
}

#[test]
fn test_missing_name_is_error() {
    let err = parse_instrument("source\n").unwrap_err();
    assert!(err.to_string().contains("Expected a name"));
    assert!(err.span().is_some());
}

#[test]
fn test_stray_token_is_error() {
    assert!(parse_instrument("source src wide width=1\n").is_err());
}

#[test]
fn test_two_component_vector_is_error() {
    let err = parse_instrument("monitor det position=(0, 1)\n").unwrap_err();
    assert!(err.to_string().contains("three components"));
}

#[test]
fn test_unbalanced_parentheses() {
    assert!(parse_instrument("monitor det position=(0, 0, 1\n").is_err());
    assert!(parse_instrument("monitor det width=1)\n").is_err());
}

#[test]
fn test_span_points_at_line() {
    let source = "source src\nmonitor det width=\n";
    let err = parse_instrument(source).unwrap_err();
    let span = err.span().unwrap();
    assert_eq!(span.start, 11);
    assert!(source[span.start..span.end].starts_with("monitor det"));
}
