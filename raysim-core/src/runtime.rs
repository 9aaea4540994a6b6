use crate::analyzer::analyze_instrument;
use crate::ast::{AttrValue, Attribute, ComponentDecl, Instrument};
use crate::components::Sampling;
use crate::diagnostics::Diagnostics;
use crate::error::SimError;
use crate::eval::{eval_expr, eval_vector, evaluate_lets, EvalContext, EvalError};
use crate::histogram::Histogram2d;
use crate::params::ComponentParams;
use crate::parser::{parse_instrument, ParseError};
use crate::ray::Ray;
use crate::simulator::Simulator;
use glam::DVec3;
use thiserror::Error;

/// Rays kept around for drawing by an interactive [`SimulationContext`]
pub const MAX_KEPT_RAYS: usize = 2000;

/// Everything that can stop an instrument file from running
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("instrument has errors:\n{0}")]
    Analysis(Diagnostics),

    #[error("{context}: {source}")]
    Eval { context: String, source: EvalError },

    #[error("parameter '{key}' on '{component}': {reason}")]
    Attribute {
        component: String,
        key: String,
        reason: String,
    },

    #[error("run setting '{key}': {reason}")]
    RunSetting { key: String, reason: String },

    #[error(transparent)]
    Simulation(#[from] SimError),
}

/// Values from the `run` directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    pub rays: usize,
    pub seed: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self { rays: 1000, seed: 0 }
    }
}

/// Command-line style overrides applied on top of the file's settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOverrides {
    pub rays: Option<usize>,
    pub seed: Option<u64>,
    pub parallel: bool,
}

impl RunOverrides {
    pub fn apply(&self, settings: RunSettings) -> RunSettings {
        RunSettings {
            rays: self.rays.unwrap_or(settings.rays),
            seed: self.seed.unwrap_or(settings.seed),
        }
    }
}

/// Accumulated result of one monitor
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorReport {
    pub name: String,
    pub width: f64,
    pub height: f64,
    pub histogram: Histogram2d,
}

/// Final result of running an instrument
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub settings: RunSettings,
    pub rays: Vec<Ray>,
    pub monitors: Vec<MonitorReport>,
}

impl SimulationResult {
    pub fn monitor(&self, name: &str) -> Option<&MonitorReport> {
        self.monitors.iter().find(|m| m.name == name)
    }
}

/// Parse and analyze; analysis errors abort, warnings are logged
pub fn load_instrument(source: &str) -> Result<Instrument, RuntimeError> {
    let instrument = parse_instrument(source)?;
    let diagnostics = analyze_instrument(&instrument);
    if diagnostics.has_errors() {
        return Err(RuntimeError::Analysis(diagnostics));
    }
    for warning in diagnostics.warnings() {
        log::warn!("{}", warning.message);
    }
    Ok(instrument)
}

/// Main entry point: parse, check and run an instrument file
pub fn run_instrument(source: &str) -> Result<SimulationResult, RuntimeError> {
    run_instrument_with(source, RunOverrides::default())
}

pub fn run_instrument_with(
    source: &str,
    overrides: RunOverrides,
) -> Result<SimulationResult, RuntimeError> {
    let instrument = load_instrument(source)?;
    let ctx = evaluate(&instrument)?;
    let settings = overrides.apply(settings_from(&instrument, &ctx)?);

    let mut simulator = assemble(&instrument, &ctx)?;
    simulator.set_seed(settings.seed);
    let rays = if overrides.parallel {
        simulator.run_parallel(settings.rays)?
    } else {
        simulator.run(settings.rays)?
    };

    Ok(SimulationResult {
        settings,
        rays,
        monitors: monitor_reports(&simulator),
    })
}

/// Build a Simulator from a checked instrument, seeded from its `run` directive
pub fn build_simulator(instrument: &Instrument) -> Result<Simulator, RuntimeError> {
    let ctx = evaluate(instrument)?;
    let settings = settings_from(instrument, &ctx)?;
    let mut simulator = assemble(instrument, &ctx)?;
    simulator.set_seed(settings.seed);
    Ok(simulator)
}

/// Settings from the instrument's `run` directive, or the defaults
pub fn run_settings(instrument: &Instrument) -> Result<RunSettings, RuntimeError> {
    let ctx = evaluate(instrument)?;
    settings_from(instrument, &ctx)
}

/// Snapshot every monitor's accumulator
pub fn monitor_reports(simulator: &Simulator) -> Vec<MonitorReport> {
    simulator
        .monitors()
        .map(|(_, component, monitor)| MonitorReport {
            name: component.name.clone(),
            width: monitor.width,
            height: monitor.height,
            histogram: monitor.histogram().clone(),
        })
        .collect()
}

fn evaluate(instrument: &Instrument) -> Result<EvalContext, RuntimeError> {
    let (ctx, diagnostics) = evaluate_lets(&instrument.lets);
    if !diagnostics.is_empty() {
        let mut all = Diagnostics::new();
        all.extend(diagnostics);
        return Err(RuntimeError::Analysis(all));
    }
    Ok(ctx)
}

fn assemble(instrument: &Instrument, ctx: &EvalContext) -> Result<Simulator, RuntimeError> {
    let mut simulator = Simulator::new();
    for decl in &instrument.components {
        let params = component_params(decl, ctx)?;
        let relative = match decl.relative() {
            Some(target) => Some(simulator.find(target).ok_or_else(|| RuntimeError::Attribute {
                component: decl.name.clone(),
                key: "relative".to_string(),
                reason: format!("no earlier component named '{}'", target),
            })?),
            None => None,
        };
        simulator.add_component(&decl.kind, params, relative)?;
    }
    Ok(simulator)
}

fn component_params(decl: &ComponentDecl, ctx: &EvalContext) -> Result<ComponentParams, RuntimeError> {
    let mut params = ComponentParams::new().name(decl.name.clone());
    let bad = |attr: &Attribute, reason: String| RuntimeError::Attribute {
        component: decl.name.clone(),
        key: attr.key.clone(),
        reason,
    };

    for attr in &decl.attributes {
        match attr.key.as_str() {
            "relative" => {}
            "sampling" => {
                let mode = match &attr.value {
                    AttrValue::Scalar(expr) => expr.as_symbol(),
                    AttrValue::Vector(_) => None,
                };
                params.sampling = Some(
                    mode.and_then(Sampling::from_name)
                        .ok_or_else(|| bad(attr, "expected 'additive' or 'cap'".to_string()))?,
                );
            }
            "position" => params.position = Some(vector(decl, attr, ctx)?),
            "rotation" => params.rotation = Some(vector(decl, attr, ctx)?),
            "normal" => params.normal = Some(vector(decl, attr, ctx)?),
            "width" => params.width = Some(scalar(decl, attr, ctx)?),
            "height" => params.height = Some(scalar(decl, attr, ctx)?),
            "length" => params.length = Some(scalar(decl, attr, ctx)?),
            "distance" => params.distance = Some(scalar(decl, attr, ctx)?),
            "spread" => params.spread = Some(scalar(decl, attr, ctx)?),
            "nx" | "ny" => {
                let value = scalar(decl, attr, ctx)?;
                let bins = whole(value)
                    .filter(|n| *n > 0)
                    .ok_or_else(|| bad(attr, format!("{} is not a positive whole number", value)))?;
                // out-of-range counts saturate and are rejected with the grid size
                let bins = usize::try_from(bins).unwrap_or(usize::MAX);
                if attr.key == "nx" {
                    params.nx = Some(bins);
                } else {
                    params.ny = Some(bins);
                }
            }
            _ => return Err(bad(attr, "unknown parameter".to_string())),
        }
    }
    Ok(params)
}

fn scalar(decl: &ComponentDecl, attr: &Attribute, ctx: &EvalContext) -> Result<f64, RuntimeError> {
    match &attr.value {
        AttrValue::Scalar(expr) => eval_expr(expr, ctx).map_err(|source| RuntimeError::Eval {
            context: format!("'{}' on '{}'", attr.key, decl.name),
            source,
        }),
        AttrValue::Vector(_) => Err(RuntimeError::Attribute {
            component: decl.name.clone(),
            key: attr.key.clone(),
            reason: "expected a single number".to_string(),
        }),
    }
}

fn vector(decl: &ComponentDecl, attr: &Attribute, ctx: &EvalContext) -> Result<DVec3, RuntimeError> {
    match &attr.value {
        AttrValue::Vector(parts) => eval_vector(parts, ctx).map_err(|source| RuntimeError::Eval {
            context: format!("'{}' on '{}'", attr.key, decl.name),
            source,
        }),
        AttrValue::Scalar(_) => Err(RuntimeError::Attribute {
            component: decl.name.clone(),
            key: attr.key.clone(),
            reason: "expected a vector (x, y, z)".to_string(),
        }),
    }
}

/// Whole non-negative numbers only
fn whole(value: f64) -> Option<u64> {
    (value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64).then_some(value as u64)
}

fn settings_from(instrument: &Instrument, ctx: &EvalContext) -> Result<RunSettings, RuntimeError> {
    let mut settings = RunSettings::default();
    let Some(run) = instrument.runs.first() else {
        return Ok(settings);
    };

    for attr in &run.attributes {
        let setting_error = |reason: String| RuntimeError::RunSetting {
            key: attr.key.clone(),
            reason,
        };
        let value = match &attr.value {
            AttrValue::Scalar(expr) => eval_expr(expr, ctx).map_err(|source| RuntimeError::Eval {
                context: format!("run setting '{}'", attr.key),
                source,
            })?,
            AttrValue::Vector(_) => return Err(setting_error("expected a single number".to_string())),
        };
        let n = whole(value)
            .ok_or_else(|| setting_error(format!("{} is not a non-negative whole number", value)))?;
        match attr.key.as_str() {
            "rays" if n == 0 => return Err(setting_error("must be positive".to_string())),
            "rays" => settings.rays = n as usize,
            "seed" => settings.seed = n,
            _ => return Err(setting_error("expected rays or seed".to_string())),
        }
    }
    Ok(settings)
}

/// Simulation context for incremental tracing
pub struct SimulationContext {
    pub simulator: Simulator,
    pub settings: RunSettings,
    /// Rays per call to [`step_simulation`]
    pub batch_size: usize,
    /// Most recent rays, oldest first, at most [`MAX_KEPT_RAYS`]
    pub rays: Vec<Ray>,
}

impl SimulationContext {
    pub fn traced(&self) -> usize {
        self.simulator.rays_traced() as usize
    }

    pub fn remaining(&self) -> usize {
        self.settings.rays.saturating_sub(self.traced())
    }

    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }

    /// Start over with the same seed
    pub fn reset(&mut self) {
        self.simulator.reset_monitors();
        self.simulator.set_seed(self.settings.seed);
        self.rays.clear();
    }
}

/// Build a simulation context from a checked instrument
pub fn build_simulation_context(instrument: &Instrument) -> Result<SimulationContext, RuntimeError> {
    let ctx = evaluate(instrument)?;
    let settings = settings_from(instrument, &ctx)?;
    let mut simulator = assemble(instrument, &ctx)?;
    simulator.set_seed(settings.seed);
    simulator.validate(settings.rays)?;

    Ok(SimulationContext {
        simulator,
        settings,
        batch_size: (settings.rays / 100).max(1),
        rays: Vec::new(),
    })
}

/// Build a simulation context from source code
pub fn build_simulation_context_from_source(
    source: &str,
) -> Result<SimulationContext, RuntimeError> {
    let instrument = load_instrument(source)?;
    build_simulation_context(&instrument)
}

/// Trace the next batch of rays; returns whether rays remain afterwards
pub fn step_simulation(ctx: &mut SimulationContext) -> Result<bool, SimError> {
    let batch = ctx.batch_size.max(1).min(ctx.remaining());
    if batch == 0 {
        return Ok(false);
    }

    let rays = ctx.simulator.run(batch)?;
    ctx.rays.extend(rays);
    if ctx.rays.len() > MAX_KEPT_RAYS {
        let excess = ctx.rays.len() - MAX_KEPT_RAYS;
        ctx.rays.drain(..excess);
    }
    Ok(!ctx.is_finished())
}
