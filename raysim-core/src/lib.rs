pub mod analyzer;
pub mod ast;
pub mod components;
pub mod diagnostics;
pub mod error;
pub mod eval;
pub mod geometry;
pub mod histogram;
pub mod instruments;
pub mod params;
pub mod parser;
pub mod pose;
pub mod ray;
pub mod runtime;
pub mod simulator;
pub mod visual;

pub use analyzer::analyze_instrument;
pub use components::{
    Component, ComponentKind, Guide, Interaction, Mirror, Monitor, Propagator, Sampling, Source,
    MAX_GUIDE_REFLECTIONS,
};
pub use diagnostics::{Diagnostic, DiagnosticSeverity, Diagnostics, SourceLocation, Span};
pub use error::SimError;
pub use histogram::Histogram2d;
pub use params::{ComponentParams, ComponentType, MAX_MONITOR_BINS};
pub use parser::parse_instrument;
pub use pose::Pose;
pub use ray::{Ray, RayColor, RayError};
pub use runtime::{
    build_simulation_context, build_simulation_context_from_source, build_simulator,
    load_instrument, monitor_reports, run_instrument, run_instrument_with, run_settings,
    step_simulation, MonitorReport, RunOverrides, RunSettings, RuntimeError, SimulationContext,
    SimulationResult,
};
pub use simulator::{ComponentId, Detection, Simulator, TracedRay};
