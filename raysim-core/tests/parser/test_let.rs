//! Parser tests for let bindings

use raysim_core::ast::Expr;
use raysim_core::parse_instrument;

#[test]
fn test_let_binding() {
    let instrument = parse_instrument("let guide_length = 4\n").unwrap();
    assert_eq!(instrument.lets.len(), 1);
    assert_eq!(instrument.lets[0].name, "guide_length");
    assert_eq!(instrument.lets[0].expr, Expr::Literal(4.0));
}

#[test]
fn test_let_with_expression() {
    let instrument = parse_instrument("let a = 2\nlet b = a * 3 + 1\n").unwrap();
    assert_eq!(instrument.lets.len(), 2);
    assert_eq!(instrument.lets[1].expr.variables(), vec!["a"]);
}

#[test]
fn test_let_without_equals() {
    let err = parse_instrument("let a 4\n").unwrap_err();
    assert!(err.to_string().contains("Expected '='"));
}

#[test]
fn test_let_invalid_name() {
    assert!(parse_instrument("let 2x = 4\n").is_err());
}
