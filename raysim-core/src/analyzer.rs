//! Static checks for instrument descriptions
//!
//! This module catches mistakes in a parsed instrument before any component
//! is built or any ray is traced.

use crate::ast::{AttrValue, Attribute, ComponentDecl, Expr, Instrument, RunDecl};
use crate::components::Sampling;
use crate::diagnostics::{Diagnostic, Diagnostics, Span};
use crate::params::ComponentType;
use std::collections::{HashMap, HashSet};

/// Analyze an instrument and return diagnostics
pub fn analyze_instrument(instrument: &Instrument) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    // Let bindings: duplicates and variables used before they exist
    let mut defined: HashSet<&str> = HashSet::new();
    for let_decl in &instrument.lets {
        for var in let_decl.expr.variables() {
            if !defined.contains(var) {
                diagnostics.push(Diagnostic::error(
                    format!("unknown variable '{}' in let binding '{}'", var, let_decl.name),
                    let_decl.span,
                ));
            }
        }
        if !defined.insert(&let_decl.name) {
            diagnostics.push(Diagnostic::error(
                format!("duplicate let binding '{}'", let_decl.name),
                let_decl.span,
            ));
        }
    }

    // Components: names, kinds, parameters and references
    let mut component_index: HashMap<&str, usize> = HashMap::new();
    for (idx, decl) in instrument.components.iter().enumerate() {
        if component_index.contains_key(decl.name.as_str()) {
            diagnostics.push(Diagnostic::error(
                format!("duplicate component name '{}'", decl.name),
                decl.span,
            ));
        } else {
            component_index.insert(&decl.name, idx);
        }
        if defined.contains(decl.name.as_str()) {
            diagnostics.push(Diagnostic::warning(
                format!("component '{}' shadows a let binding of the same name", decl.name),
                decl.span,
            ));
        }

        diagnostics.extend(check_component(decl, idx, &defined, &instrument.components));
    }

    if instrument.components.is_empty() {
        diagnostics.push(Diagnostic::error("instrument declares no components", None));
    }

    // Rays need a starting point before anything that reads their position
    let first = instrument.components.iter().find(|decl| {
        ComponentType::from_name(&decl.kind).map_or(true, |ty| ty != ComponentType::Arm)
    });
    if let Some(decl) = first {
        if let Some(ty) = ComponentType::from_name(&decl.kind) {
            if ty != ComponentType::Source {
                diagnostics.push(Diagnostic::error(
                    format!(
                        "first component '{}' is a {}; rays need a source before it",
                        decl.name,
                        ty.name().to_lowercase()
                    ),
                    decl.span,
                ));
            }
        }
    }

    let has_monitor = instrument
        .components
        .iter()
        .any(|decl| ComponentType::from_name(&decl.kind) == Some(ComponentType::Monitor));
    if !instrument.components.is_empty() && !has_monitor {
        diagnostics.push(Diagnostic::warning(
            "instrument has no monitor; nothing will be recorded",
            None,
        ));
    }

    // Run directive
    if instrument.runs.len() > 1 {
        diagnostics.push(Diagnostic::error(
            "more than one run directive",
            instrument.runs[1].span,
        ));
    }
    for run in &instrument.runs {
        diagnostics.extend(check_run(run, &defined));
    }

    diagnostics
}

fn check_component(
    decl: &ComponentDecl,
    idx: usize,
    variables: &HashSet<&str>,
    components: &[ComponentDecl],
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let span = decl.span;

    let ty = ComponentType::from_name(&decl.kind);
    if ty.is_none() {
        diagnostics.push(Diagnostic::error(
            format!(
                "unknown component kind '{}' for '{}' (expected source, arm, propagator, guide, mirror or monitor)",
                decl.kind, decl.name
            ),
            span,
        ));
    }

    let mut seen = HashSet::new();
    for attr in &decl.attributes {
        if !seen.insert(attr.key.as_str()) {
            diagnostics.push(Diagnostic::error(
                format!("duplicate parameter '{}' on '{}'", attr.key, decl.name),
                span,
            ));
        }

        match attr.key.as_str() {
            "relative" => check_relative(decl, attr, idx, components, &mut diagnostics),
            "sampling" => {
                if ty.is_some_and(|ty| !ty.accepts("sampling")) {
                    diagnostics.push(not_applicable(decl, attr));
                }
                let mode = match &attr.value {
                    AttrValue::Scalar(expr) => expr.as_symbol(),
                    AttrValue::Vector(_) => None,
                };
                if mode.and_then(Sampling::from_name).is_none() {
                    diagnostics.push(Diagnostic::error(
                        format!(
                            "sampling on '{}' must be 'additive' or 'cap'",
                            decl.name
                        ),
                        span,
                    ));
                }
            }
            key => {
                if let Some(ty) = ty {
                    if !ty.accepts(key) {
                        diagnostics.push(not_applicable(decl, attr));
                        continue;
                    }
                }
                check_shape(attr, ComponentType::is_vector_param(key), &decl.name, span, &mut diagnostics);
                check_variables(&attr.value, variables, &decl.name, span, &mut diagnostics);
            }
        }
    }

    diagnostics
}

fn not_applicable(decl: &ComponentDecl, attr: &Attribute) -> Diagnostic {
    Diagnostic::error(
        format!(
            "parameter '{}' does not apply to {} '{}'",
            attr.key, decl.kind, decl.name
        ),
        decl.span,
    )
}

fn check_relative(
    decl: &ComponentDecl,
    attr: &Attribute,
    idx: usize,
    components: &[ComponentDecl],
    diagnostics: &mut Vec<Diagnostic>,
) {
    let target = match &attr.value {
        AttrValue::Scalar(expr) => expr.as_symbol(),
        AttrValue::Vector(_) => None,
    };
    let Some(target) = target else {
        diagnostics.push(Diagnostic::error(
            format!("relative on '{}' must name a component", decl.name),
            decl.span,
        ));
        return;
    };

    match components.iter().position(|c| c.name == target) {
        None => diagnostics.push(Diagnostic::error(
            format!("unknown component '{}' referenced by '{}'", target, decl.name),
            decl.span,
        )),
        Some(pos) if pos >= idx => diagnostics.push(Diagnostic::error(
            format!(
                "'{}' is placed relative to '{}', which is not declared before it",
                decl.name, target
            ),
            decl.span,
        )),
        Some(_) => {}
    }
}

fn check_shape(
    attr: &Attribute,
    wants_vector: bool,
    owner: &str,
    span: Option<Span>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let is_vector = matches!(attr.value, AttrValue::Vector(_));
    if wants_vector && !is_vector {
        diagnostics.push(Diagnostic::error(
            format!("'{}' on '{}' expects a vector (x, y, z)", attr.key, owner),
            span,
        ));
    } else if !wants_vector && is_vector {
        diagnostics.push(Diagnostic::error(
            format!("'{}' on '{}' expects a single number", attr.key, owner),
            span,
        ));
    }
}

fn check_variables(
    value: &AttrValue,
    variables: &HashSet<&str>,
    owner: &str,
    span: Option<Span>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let exprs: Vec<&Expr> = match value {
        AttrValue::Scalar(expr) => vec![expr],
        AttrValue::Vector(parts) => parts.iter().collect(),
    };
    for var in exprs.into_iter().flat_map(Expr::variables) {
        if !variables.contains(var) {
            diagnostics.push(Diagnostic::error(
                format!("unknown variable '{}' in '{}'", var, owner),
                span,
            ));
        }
    }
}

fn check_run(run: &RunDecl, variables: &HashSet<&str>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut seen = HashSet::new();
    for attr in &run.attributes {
        if !seen.insert(attr.key.as_str()) {
            diagnostics.push(Diagnostic::error(
                format!("duplicate run setting '{}'", attr.key),
                run.span,
            ));
        }
        if !matches!(attr.key.as_str(), "rays" | "seed") {
            diagnostics.push(Diagnostic::error(
                format!("unknown run setting '{}' (expected rays or seed)", attr.key),
                run.span,
            ));
            continue;
        }
        check_shape(attr, false, "run", run.span, &mut diagnostics);
        check_variables(&attr.value, variables, "run", run.span, &mut diagnostics);
    }
    diagnostics
}
