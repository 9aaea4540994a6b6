//! Keyword-style construction of components
//!
//! [`ComponentParams`] plays the role of a keyword-argument list: every field
//! is optional, unset fields fall back to the kind's defaults, and fields that
//! make no sense for the requested kind are rejected.

use crate::components::{ComponentKind, Guide, Mirror, Monitor, Propagator, Sampling, Source};
use crate::error::SimError;
use crate::pose::Pose;
use glam::DVec3;
use std::f64::consts::FRAC_PI_2;

/// Upper bound on `nx * ny` for a single monitor
pub const MAX_MONITOR_BINS: usize = 4096 * 4096;

/// The component kinds the factory knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    Source,
    Arm,
    Propagator,
    Guide,
    Mirror,
    Monitor,
}

impl ComponentType {
    pub const ALL: [ComponentType; 6] = [
        ComponentType::Source,
        ComponentType::Arm,
        ComponentType::Propagator,
        ComponentType::Guide,
        ComponentType::Mirror,
        ComponentType::Monitor,
    ];

    /// Look up a kind by name, ignoring ASCII case
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            ComponentType::Source => "Source",
            ComponentType::Arm => "Arm",
            ComponentType::Propagator => "Propagator",
            ComponentType::Guide => "Guide",
            ComponentType::Mirror => "Mirror",
            ComponentType::Monitor => "Monitor",
        }
    }

    /// Parameters this kind accepts besides `position` and `rotation`
    pub fn geometry_params(self) -> &'static [&'static str] {
        match self {
            ComponentType::Source => &["width", "height", "spread", "normal", "sampling"],
            ComponentType::Arm => &[],
            ComponentType::Propagator => &["distance"],
            ComponentType::Guide => &["width", "height", "length"],
            ComponentType::Mirror => &["width", "height"],
            ComponentType::Monitor => &["width", "height", "nx", "ny"],
        }
    }

    pub fn accepts(self, param: &str) -> bool {
        param == "position" || param == "rotation" || self.geometry_params().contains(&param)
    }

    /// Whether the parameter takes a 3-vector rather than a scalar
    pub fn is_vector_param(param: &str) -> bool {
        matches!(param, "position" | "rotation" | "normal")
    }
}

/// Optional placement and geometry for a new component
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentParams {
    pub name: Option<String>,
    pub position: Option<DVec3>,
    /// Euler angles in degrees
    pub rotation: Option<DVec3>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub length: Option<f64>,
    pub distance: Option<f64>,
    /// Degrees
    pub spread: Option<f64>,
    pub normal: Option<DVec3>,
    pub nx: Option<usize>,
    pub ny: Option<usize>,
    pub sampling: Option<Sampling>,
}

impl ComponentParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn position(mut self, position: impl Into<DVec3>) -> Self {
        self.position = Some(position.into());
        self
    }

    pub fn rotation(mut self, degrees: impl Into<DVec3>) -> Self {
        self.rotation = Some(degrees.into());
        self
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn length(mut self, length: f64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }

    pub fn spread(mut self, degrees: f64) -> Self {
        self.spread = Some(degrees);
        self
    }

    pub fn normal(mut self, normal: impl Into<DVec3>) -> Self {
        self.normal = Some(normal.into());
        self
    }

    pub fn bins(mut self, nx: usize, ny: usize) -> Self {
        self.nx = Some(nx);
        self.ny = Some(ny);
        self
    }

    pub fn sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = Some(sampling);
        self
    }

    /// Names of the parameters that were given
    pub fn provided(&self) -> Vec<&'static str> {
        let flags = [
            ("position", self.position.is_some()),
            ("rotation", self.rotation.is_some()),
            ("width", self.width.is_some()),
            ("height", self.height.is_some()),
            ("length", self.length.is_some()),
            ("distance", self.distance.is_some()),
            ("spread", self.spread.is_some()),
            ("normal", self.normal.is_some()),
            ("nx", self.nx.is_some()),
            ("ny", self.ny.is_some()),
            ("sampling", self.sampling.is_some()),
        ];
        flags
            .into_iter()
            .filter_map(|(name, set)| set.then_some(name))
            .collect()
    }

    /// Placement relative to the reference frame
    pub fn local_pose(&self, component: &str, ty: ComponentType) -> Result<Pose, SimError> {
        let position = self.position.unwrap_or(DVec3::ZERO);
        let rotation = self.rotation.unwrap_or(DVec3::ZERO);
        let check = Check {
            component,
            kind: ty.name(),
        };
        check.finite_vec("position", position)?;
        check.finite_vec("rotation", rotation)?;
        Ok(Pose::from_euler_degrees(position, rotation))
    }

    /// Build the geometry for `ty`, applying defaults and validating values
    pub fn build(&self, ty: ComponentType, component: &str) -> Result<ComponentKind, SimError> {
        if let Some(param) = self.provided().into_iter().find(|p| !ty.accepts(p)) {
            return Err(SimError::UnsupportedParameter {
                kind: ty.name(),
                param,
            });
        }
        let check = Check {
            component,
            kind: ty.name(),
        };

        let kind = match ty {
            ComponentType::Source => {
                let spread = self.spread.unwrap_or(1.0);
                if !(0.0..90.0).contains(&spread) {
                    return Err(check.invalid(
                        "spread",
                        format!("{} degrees is outside [0, 90)", spread),
                    ));
                }
                let normal = self.normal.unwrap_or(DVec3::Z);
                let normal = normal
                    .try_normalize()
                    .ok_or_else(|| check.invalid("normal", "must be a nonzero finite vector".to_string()))?;

                let mut source = Source::new(
                    self.width.unwrap_or(1.0),
                    self.height.unwrap_or(1.0),
                    spread,
                );
                source.normal = normal;
                source.sampling = self.sampling.unwrap_or_default();
                ComponentKind::Source(source)
            }
            ComponentType::Arm => ComponentKind::Arm,
            ComponentType::Propagator => ComponentKind::Propagator(Propagator {
                distance: self.distance.unwrap_or(1.0),
            }),
            ComponentType::Guide => ComponentKind::Guide(Guide {
                width: self.width.unwrap_or(0.1),
                height: self.height.unwrap_or(0.1),
                length: self.length.unwrap_or(1.0),
            }),
            ComponentType::Mirror => ComponentKind::Mirror(Mirror {
                width: self.width.unwrap_or(1.0),
                height: self.height.unwrap_or(1.0),
            }),
            ComponentType::Monitor => {
                let nx = self.nx.unwrap_or(20);
                let ny = self.ny.unwrap_or(20);
                // the histogram is allocated here, so the grid size goes first
                check.bins(nx, ny)?;
                ComponentKind::Monitor(Monitor::new(
                    self.width.unwrap_or(1.0),
                    self.height.unwrap_or(1.0),
                    nx,
                    ny,
                ))
            }
        };
        kind.validate(component)?;
        Ok(kind)
    }
}

impl ComponentKind {
    /// Reject geometry that cannot be traced
    pub fn validate(&self, component: &str) -> Result<(), SimError> {
        let check = Check {
            component,
            kind: self.type_name(),
        };
        match self {
            ComponentKind::Source(source) => {
                check.positive("width", source.width)?;
                check.positive("height", source.height)?;
                if !(0.0..FRAC_PI_2).contains(&source.spread) {
                    return Err(check.invalid(
                        "spread",
                        format!("{} degrees is outside [0, 90)", source.spread.to_degrees()),
                    ));
                }
                if !source.normal.is_finite() || !source.normal.is_normalized() {
                    return Err(check.invalid("normal", format!("{} is not a unit vector", source.normal)));
                }
            }
            ComponentKind::Arm => {}
            ComponentKind::Propagator(propagator) => {
                check.positive("distance", propagator.distance)?;
            }
            ComponentKind::Guide(guide) => {
                check.positive("width", guide.width)?;
                check.positive("height", guide.height)?;
                check.positive("length", guide.length)?;
            }
            ComponentKind::Mirror(mirror) => {
                check.positive("width", mirror.width)?;
                check.positive("height", mirror.height)?;
            }
            ComponentKind::Monitor(monitor) => {
                check.positive("width", monitor.width)?;
                check.positive("height", monitor.height)?;
                let (nx, ny) = monitor.bins();
                check.bins(nx, ny)?;
            }
        }
        Ok(())
    }
}

struct Check<'a> {
    component: &'a str,
    kind: &'static str,
}

impl Check<'_> {
    fn invalid(&self, param: &'static str, reason: String) -> SimError {
        SimError::InvalidGeometry {
            component: self.component.to_string(),
            kind: self.kind,
            param,
            reason,
        }
    }

    fn positive(&self, param: &'static str, value: f64) -> Result<f64, SimError> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(self.invalid(param, format!("{} is not a positive length", value)))
        }
    }

    fn bins(&self, nx: usize, ny: usize) -> Result<(), SimError> {
        if nx == 0 {
            return Err(self.invalid("nx", "needs at least one bin".to_string()));
        }
        if ny == 0 {
            return Err(self.invalid("ny", "needs at least one bin".to_string()));
        }
        match nx.checked_mul(ny) {
            Some(total) if total <= MAX_MONITOR_BINS => Ok(()),
            _ => Err(self.invalid(
                "nx",
                format!("{} x {} bins exceeds the limit of {}", nx, ny, MAX_MONITOR_BINS),
            )),
        }
    }

    fn finite_vec(&self, param: &'static str, value: DVec3) -> Result<(), SimError> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(self.invalid(param, format!("{} is not finite", value)))
        }
    }
}
