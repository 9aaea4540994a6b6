//! Expression evaluation for instrument files
//!
//! Expressions are reduced to concrete f64 values before the simulator is built.

use crate::ast::{BinaryOp, Expr, FuncName, LetDecl};
use crate::diagnostics::Diagnostic;
use glam::DVec3;
use std::collections::HashMap;
use thiserror::Error;

/// Evaluation context storing variable values
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    /// Values of let-bindings after evaluation
    pub values: HashMap<String, f64>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }
}

/// Evaluation error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unknown variable '{0}'")]
    UnknownVar(String),
    #[error("division by zero")]
    DivByZero,
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("result is not a finite number")]
    NotFinite,
}

/// Evaluate all let-bindings in order
/// Returns the evaluation context and any diagnostics
pub fn evaluate_lets(lets: &[LetDecl]) -> (EvalContext, Vec<Diagnostic>) {
    let mut ctx = EvalContext::new();
    let mut diagnostics = Vec::new();

    for let_decl in lets {
        match eval_expr(&let_decl.expr, &ctx) {
            Ok(value) => {
                ctx.values.insert(let_decl.name.clone(), value);
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("error evaluating let binding '{}': {}", let_decl.name, e),
                    let_decl.span,
                ));
            }
        }
    }

    (ctx, diagnostics)
}

/// Evaluate an expression to a finite f64
pub fn eval_expr(expr: &Expr, ctx: &EvalContext) -> Result<f64, EvalError> {
    let value = eval_inner(expr, ctx)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::NotFinite)
    }
}

/// Evaluate the three components of a vector literal
pub fn eval_vector(exprs: &[Expr; 3], ctx: &EvalContext) -> Result<DVec3, EvalError> {
    Ok(DVec3::new(
        eval_expr(&exprs[0], ctx)?,
        eval_expr(&exprs[1], ctx)?,
        eval_expr(&exprs[2], ctx)?,
    ))
}

fn eval_inner(expr: &Expr, ctx: &EvalContext) -> Result<f64, EvalError> {
    match expr {
        Expr::Literal(v) => Ok(*v),

        Expr::Var(name) => ctx
            .lookup(name)
            .ok_or_else(|| EvalError::UnknownVar(name.clone())),

        Expr::UnaryMinus(e) => Ok(-eval_inner(e, ctx)?),

        Expr::Binary { op, left, right } => {
            let left_val = eval_inner(left, ctx)?;
            let right_val = eval_inner(right, ctx)?;

            match op {
                BinaryOp::Add => Ok(left_val + right_val),
                BinaryOp::Sub => Ok(left_val - right_val),
                BinaryOp::Mul => Ok(left_val * right_val),
                BinaryOp::Div => {
                    if right_val == 0.0 {
                        return Err(EvalError::DivByZero);
                    }
                    Ok(left_val / right_val)
                }
            }
        }

        Expr::Call { func, args } => {
            let arg_values = args
                .iter()
                .map(|arg| eval_inner(arg, ctx))
                .collect::<Result<Vec<f64>, _>>()?;

            let [x] = arg_values[..] else {
                return Err(EvalError::InvalidArgs(format!(
                    "{} expects 1 argument, got {}",
                    func_label(*func),
                    arg_values.len()
                )));
            };

            match func {
                FuncName::Sin => Ok(x.sin()),
                FuncName::Cos => Ok(x.cos()),
                FuncName::Sqrt => {
                    if x < 0.0 {
                        return Err(EvalError::InvalidArgs(format!(
                            "sqrt of negative number: {}",
                            x
                        )));
                    }
                    Ok(x.sqrt())
                }
                FuncName::Radians => Ok(x.to_radians()),
                FuncName::Degrees => Ok(x.to_degrees()),
            }
        }
    }
}

fn func_label(func: FuncName) -> &'static str {
    match func {
        FuncName::Sin => "sin",
        FuncName::Cos => "cos",
        FuncName::Sqrt => "sqrt",
        FuncName::Radians => "radians",
        FuncName::Degrees => "degrees",
    }
}
