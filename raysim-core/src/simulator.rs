use crate::components::{Component, ComponentKind, Interaction, Monitor};
use crate::error::SimError;
use crate::params::{ComponentParams, ComponentType};
use crate::pose::Pose;
use crate::ray::{Ray, RayError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

/// Handle to a component inside a [`Simulator`], usable as a later `relative`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(usize);

impl ComponentId {
    pub fn index(self) -> usize {
        self.0
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }
}

/// A monitor hit waiting to be added to its accumulator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub component: ComponentId,
    pub ix: usize,
    pub iy: usize,
    pub weight: f64,
}

/// One finished ray and the monitor hits it produced
#[derive(Debug, Clone)]
pub struct TracedRay {
    pub ray: Ray,
    pub detections: Vec<Detection>,
}

/// Ordered chain of placed components that rays are pushed through
#[derive(Debug, Clone, Default)]
pub struct Simulator {
    components: Vec<Component>,
    seed: u64,
    rays_traced: u64,
}

/// Move a globally described ray into `component`'s frame
pub fn to_local(ray: &mut Ray, component: &Component) -> Result<(), RayError> {
    component.global.ray_to_local(ray)
}

/// Inverse of [`to_local`]
pub fn to_global(ray: &mut Ray, component: &Component) -> Result<(), RayError> {
    component.global.ray_to_global(ray)
}

/// Random stream for a single ray, independent of which thread traces it
fn ray_rng(seed: u64, index: u64) -> StdRng {
    StdRng::seed_from_u64(seed ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

impl Simulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Change the seed; the ray counter restarts so the next run is reproducible
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.rays_traced = 0;
    }

    /// Number of rays traced since construction or the last seed change
    pub fn rays_traced(&self) -> u64 {
        self.rays_traced
    }

    /// Construct a component by kind name and place it after the existing ones.
    ///
    /// `relative` names an earlier component whose global pose the new
    /// component's position and rotation are expressed in; without it they are
    /// taken relative to the world origin.
    pub fn add_component(
        &mut self,
        kind: &str,
        params: ComponentParams,
        relative: Option<ComponentId>,
    ) -> Result<ComponentId, SimError> {
        let ty = ComponentType::from_name(kind)
            .ok_or_else(|| SimError::UnknownKind(kind.to_string()))?;
        let name = params.name.clone().unwrap_or_else(|| {
            format!("{}{}", ty.name().to_lowercase(), self.components.len())
        });
        let geometry = params.build(ty, &name)?;
        let local = params.local_pose(&name, ty)?;
        self.insert(name, geometry, local, relative)
    }

    /// Place an already built component; its geometry is checked the same
    /// way [`Simulator::add_component`] checks it
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        kind: ComponentKind,
        local: Pose,
        relative: Option<ComponentId>,
    ) -> Result<ComponentId, SimError> {
        let name = name.into();
        if self.find(&name).is_some() {
            return Err(SimError::DuplicateName(name));
        }
        kind.validate(&name)?;
        let reference = match relative {
            Some(id) => {
                self.components
                    .get(id.0)
                    .ok_or(SimError::UnknownComponent(id.0))?
                    .global
            }
            None => Pose::IDENTITY,
        };
        let global = reference.compose(&local);

        log::debug!(
            "placed {} '{}' at {} rotated {}",
            kind.type_name(),
            name,
            global.position,
            global.euler_degrees()
        );

        let id = ComponentId(self.components.len());
        self.components.push(Component {
            name,
            kind,
            local,
            global,
        });
        Ok(id)
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.0)
    }

    pub fn find(&self, name: &str) -> Option<ComponentId> {
        self.components
            .iter()
            .position(|c| c.name == name)
            .map(ComponentId)
    }

    pub fn monitor(&self, id: ComponentId) -> Option<&Monitor> {
        self.component(id).and_then(Component::monitor)
    }

    /// All monitors in traversal order
    pub fn monitors(&self) -> impl Iterator<Item = (ComponentId, &Component, &Monitor)> {
        self.components
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.monitor().map(|m| (ComponentId(i), c, m)))
    }

    fn monitor_mut(&mut self, id: ComponentId) -> Option<&mut Monitor> {
        match self.components.get_mut(id.0).map(|c| &mut c.kind) {
            Some(ComponentKind::Monitor(monitor)) => Some(monitor),
            _ => None,
        }
    }

    /// Zero every monitor accumulator
    pub fn reset_monitors(&mut self) {
        for component in &mut self.components {
            if let ComponentKind::Monitor(monitor) = &mut component.kind {
                monitor.clear();
            }
        }
    }

    /// Check that a run of `num_rays` can start
    pub fn validate(&self, num_rays: usize) -> Result<(), SimError> {
        if num_rays == 0 {
            return Err(SimError::NoRays);
        }
        if self.components.is_empty() {
            return Err(SimError::Empty);
        }
        let first = self
            .components
            .iter()
            .find(|c| !matches!(c.kind, ComponentKind::Arm));
        match first {
            Some(c) if c.kind.needs_origin() => Err(SimError::MissingSource {
                component: c.name.clone(),
                kind: c.kind.type_name(),
            }),
            _ => Ok(()),
        }
    }

    /// Push ray number `index` through every component in order.
    ///
    /// Only reads the components; monitor hits come back as detections.
    pub fn trace_ray(&self, index: u64) -> Result<TracedRay, SimError> {
        let mut rng = ray_rng(self.seed, index);
        let mut ray = Ray::new();
        let mut detections = Vec::new();

        for (i, component) in self.components.iter().enumerate() {
            let fail = |source: RayError| SimError::Ray {
                index,
                component: component.name.clone(),
                source,
            };
            to_local(&mut ray, component).map_err(fail)?;
            let interaction = component.kind.interact(&mut ray, &mut rng).map_err(fail)?;
            to_global(&mut ray, component).map_err(fail)?;

            log::trace!("ray {} at '{}': {:?}", index, component.name, interaction);
            if let Interaction::Detected { ix, iy, weight } = interaction {
                detections.push(Detection {
                    component: ComponentId(i),
                    ix,
                    iy,
                    weight,
                });
            }
        }

        Ok(TracedRay { ray, detections })
    }

    /// Trace `num_rays` independent rays one after another
    pub fn run(&mut self, num_rays: usize) -> Result<Vec<Ray>, SimError> {
        self.validate(num_rays)?;
        let start = self.rays_traced;
        let traced = (0..num_rays as u64)
            .map(|i| self.trace_ray(start + i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.record(traced))
    }

    /// Trace `num_rays` rays on the rayon pool.
    ///
    /// Each ray carries its own random stream and detections, which are merged
    /// into the monitors in ray order afterwards, so the outcome matches [`run`].
    ///
    /// [`run`]: Simulator::run
    pub fn run_parallel(&mut self, num_rays: usize) -> Result<Vec<Ray>, SimError> {
        self.validate(num_rays)?;
        let start = self.rays_traced;
        let this = &*self;
        let traced = (0..num_rays)
            .into_par_iter()
            .map(|i| this.trace_ray(start + i as u64))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.record(traced))
    }

    fn record(&mut self, traced: Vec<TracedRay>) -> Vec<Ray> {
        let mut detected = 0usize;
        let mut rays = Vec::with_capacity(traced.len());
        for TracedRay { ray, detections } in traced {
            for hit in detections {
                if let Some(monitor) = self.monitor_mut(hit.component) {
                    if monitor.record(hit.ix, hit.iy, hit.weight) {
                        detected += 1;
                    }
                }
            }
            rays.push(ray);
        }
        self.rays_traced += rays.len() as u64;

        log::info!(
            "traced {} rays through {} components, {} monitor hits",
            rays.len(),
            self.components.len(),
            detected
        );
        rays
    }
}
