use crate::ray::RayError;
use thiserror::Error;

/// Failures while assembling or running a simulator
#[derive(Debug, Error)]
pub enum SimError {
    #[error("unknown component kind '{0}' (expected Source, Arm, Propagator, Guide, Mirror or Monitor)")]
    UnknownKind(String),

    #[error("parameter '{param}' does not apply to a {kind}")]
    UnsupportedParameter {
        kind: &'static str,
        param: &'static str,
    },

    #[error("invalid {param} for {kind} '{component}': {reason}")]
    InvalidGeometry {
        component: String,
        kind: &'static str,
        param: &'static str,
        reason: String,
    },

    #[error("no component with id {0}")]
    UnknownComponent(usize),

    #[error("a component named '{0}' already exists")]
    DuplicateName(String),

    #[error("{kind} '{component}' has no source upstream to start rays from")]
    MissingSource {
        component: String,
        kind: &'static str,
    },

    #[error("instrument has no components")]
    Empty,

    #[error("number of rays must be positive")]
    NoRays,

    #[error("ray {index} failed at '{component}': {source}")]
    Ray {
        index: u64,
        component: String,
        source: RayError,
    },
}
