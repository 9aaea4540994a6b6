//! Parser tests for arithmetic expressions

use raysim_core::ast::{BinaryOp, Expr, FuncName};
use raysim_core::parser::parse_expr;

#[test]
fn test_literals() {
    assert_eq!(parse_expr("2.5", None).unwrap(), Expr::Literal(2.5));
    assert_eq!(parse_expr("1e-9", None).unwrap(), Expr::Literal(1e-9));
    assert_eq!(
        parse_expr("-4", None).unwrap(),
        Expr::UnaryMinus(Box::new(Expr::Literal(4.0)))
    );
}

#[test]
fn test_subtraction_is_left_associative() {
    let expr = parse_expr("10 - 4 - 3", None).unwrap();
    match expr {
        Expr::Binary {
            op: BinaryOp::Sub,
            left,
            right,
        } => {
            assert!(matches!(*left, Expr::Binary { op: BinaryOp::Sub, .. }));
            assert_eq!(*right, Expr::Literal(3.0));
        }
        other => panic!("Expected subtraction, got {:?}", other),
    }
}

#[test]
fn test_multiplication_binds_tighter() {
    let expr = parse_expr("a + b * 2", None).unwrap();
    match expr {
        Expr::Binary {
            op: BinaryOp::Add,
            right,
            ..
        } => assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. })),
        other => panic!("Expected addition at the top, got {:?}", other),
    }
}

#[test]
fn test_negative_operand() {
    let expr = parse_expr("2 * -3", None).unwrap();
    assert!(matches!(expr, Expr::Binary { op: BinaryOp::Mul, .. }));
}

#[test]
fn test_function_calls() {
    match parse_expr("sin(radians(30))", None).unwrap() {
        Expr::Call { func, args } => {
            assert_eq!(func, FuncName::Sin);
            assert!(matches!(
                args[0],
                Expr::Call {
                    func: FuncName::Radians,
                    ..
                }
            ));
        }
        other => panic!("Expected call, got {:?}", other),
    }
}

#[test]
fn test_unknown_function() {
    let err = parse_expr("tan(1)", None).unwrap_err();
    assert!(err.to_string().contains("Unknown function 'tan'"));
}

#[test]
fn test_variables_are_collected() {
    let expr = parse_expr("guide_length + tilt * sqrt(gap)", None).unwrap();
    assert_eq!(expr.variables(), vec!["guide_length", "tilt", "gap"]);
}

#[test]
fn test_garbage() {
    assert!(parse_expr("", None).is_err());
    assert!(parse_expr("1 +", None).is_err());
    assert!(parse_expr("3$", None).is_err());
}
