//! The pieces of apparatus a ray can meet
//!
//! Every component works in its own local frame: the simulator moves the ray
//! into that frame before calling [`ComponentKind::interact`] and back out
//! afterwards.

use crate::geometry::{reflect, Hit, Plane};
use crate::histogram::{linspace, Histogram2d};
use crate::pose::Pose;
use crate::ray::{Ray, RayError};
use glam::{DQuat, DVec3};
use rand::Rng;
use std::f64::consts::TAU;

/// Safety valve for rays trapped between guide walls
pub const MAX_GUIDE_REFLECTIONS: usize = 500;

/// How a source turns its angular spread into directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sampling {
    /// `normalize(normal + deviation)`: the classic construction, which narrows
    /// and biases the cone for large spreads
    #[default]
    Additive,
    /// Uniform over the spherical cap of half-angle `spread` around the normal
    SphericalCap,
}

impl Sampling {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "additive" => Some(Sampling::Additive),
            "cap" | "spherical_cap" => Some(Sampling::SphericalCap),
            _ => None,
        }
    }
}

/// Emits rays from a rectangle in the local z = 0 plane
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub width: f64,
    pub height: f64,
    /// Half-angle of the emission cone, radians
    pub spread: f64,
    /// Unit vector the emission cone is centered on
    pub normal: DVec3,
    pub sampling: Sampling,
}

impl Source {
    pub fn new(width: f64, height: f64, spread_degrees: f64) -> Self {
        Self {
            width,
            height,
            spread: spread_degrees.to_radians(),
            normal: DVec3::Z,
            sampling: Sampling::Additive,
        }
    }

    fn emit<R: Rng + ?Sized>(&self, ray: &mut Ray, rng: &mut R) -> Result<(), RayError> {
        let x = rng.gen_range(-self.width / 2.0..=self.width / 2.0);
        let y = rng.gen_range(-self.height / 2.0..=self.height / 2.0);
        ray.append_point(DVec3::new(x, y, 0.0));

        let theta = match self.sampling {
            Sampling::Additive => rng.gen_range(-self.spread..=self.spread),
            Sampling::SphericalCap => rng.gen_range(self.spread.cos()..=1.0).acos(),
        };
        let phi = rng.gen_range(0.0..TAU);
        let deviation = DVec3::new(
            theta.sin() * phi.cos(),
            theta.sin() * phi.sin(),
            theta.cos(),
        );
        let rotated = DQuat::from_rotation_arc(DVec3::Z, self.normal) * deviation;

        match self.sampling {
            Sampling::Additive => ray.set_direction(self.normal + rotated),
            Sampling::SphericalCap => ray.set_direction(rotated),
        }
    }
}

/// Moves the ray a fixed distance along its current direction
#[derive(Debug, Clone, PartialEq)]
pub struct Propagator {
    pub distance: f64,
}

/// Flat rectangular mirror in the local x = 0 plane.
///
/// `width` spans local z and `height` spans local y.
#[derive(Debug, Clone, PartialEq)]
pub struct Mirror {
    pub width: f64,
    pub height: f64,
}

impl Mirror {
    const NORMAL: DVec3 = DVec3::X;

    fn reflect_ray(&self, ray: &mut Ray) -> Result<Interaction, RayError> {
        let origin = ray.origin()?;
        let plane = Plane::new(DVec3::ZERO, Self::NORMAL);
        let Some(hit) = plane.intersect(origin, ray.direction()) else {
            return Ok(Interaction::Missed);
        };
        if hit.point.z.abs() > self.width / 2.0 || hit.point.y.abs() > self.height / 2.0 {
            return Ok(Interaction::Missed);
        }

        ray.append_point(hit.point);
        ray.set_direction(reflect(ray.direction(), Self::NORMAL))?;
        Ok(Interaction::Reflected)
    }
}

/// Position sensitive detector in the local z = 0 plane
#[derive(Debug, Clone, PartialEq)]
pub struct Monitor {
    pub width: f64,
    pub height: f64,
    histogram: Histogram2d,
}

impl Monitor {
    const NORMAL: DVec3 = DVec3::Z;

    pub fn new(width: f64, height: f64, nx: usize, ny: usize) -> Self {
        Self {
            width,
            height,
            histogram: Histogram2d::new(nx, ny),
        }
    }

    pub fn histogram(&self) -> &Histogram2d {
        &self.histogram
    }

    pub fn bins(&self) -> (usize, usize) {
        self.histogram.shape()
    }

    pub fn record(&mut self, ix: usize, iy: usize, weight: f64) -> bool {
        self.histogram.record(ix, iy, weight)
    }

    pub fn clear(&mut self) {
        self.histogram.clear();
    }

    /// Bin holding the local point `(x, y)`; the upper edges fold into the last bin
    pub fn bin_of(&self, x: f64, y: f64) -> (usize, usize) {
        let (nx, ny) = self.bins();
        let ix = (nx as f64 * (x + self.width / 2.0) / self.width).floor();
        let iy = (ny as f64 * (y + self.height / 2.0) / self.height).floor();
        (
            (ix.max(0.0) as usize).min(nx - 1),
            (iy.max(0.0) as usize).min(ny - 1),
        )
    }

    /// Bin positions along x and y, spanning the monitor edge to edge
    pub fn axes(&self) -> (Vec<f64>, Vec<f64>) {
        let (nx, ny) = self.bins();
        (
            linspace(-self.width / 2.0, self.width / 2.0, nx),
            linspace(-self.height / 2.0, self.height / 2.0, ny),
        )
    }

    fn detect(&self, ray: &mut Ray) -> Result<Interaction, RayError> {
        let origin = ray.origin()?;
        let plane = Plane::new(DVec3::ZERO, Self::NORMAL);
        let Some(hit) = plane.intersect(origin, ray.direction()) else {
            return Ok(Interaction::Missed);
        };
        if hit.point.x.abs() > self.width / 2.0 || hit.point.y.abs() > self.height / 2.0 {
            return Ok(Interaction::Missed);
        }

        let (ix, iy) = self.bin_of(hit.point.x, hit.point.y);
        ray.append_point(hit.point);
        Ok(Interaction::Detected {
            ix,
            iy,
            weight: ray.weight,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wall {
    Bottom,
    Top,
    Left,
    Right,
}

const WALLS: [Wall; 4] = [Wall::Bottom, Wall::Top, Wall::Left, Wall::Right];

/// Rectangular channel with mirror walls, open at z = 0 and z = length
#[derive(Debug, Clone, PartialEq)]
pub struct Guide {
    pub width: f64,
    pub height: f64,
    pub length: f64,
}

impl Guide {
    fn wall_normal(wall: Wall) -> DVec3 {
        match wall {
            Wall::Bottom => DVec3::Y,
            Wall::Top => DVec3::NEG_Y,
            Wall::Left => DVec3::X,
            Wall::Right => DVec3::NEG_X,
        }
    }

    fn wall_plane(&self, wall: Wall) -> Plane {
        let mid = self.length / 2.0;
        let point = match wall {
            Wall::Bottom => DVec3::new(0.0, -self.height / 2.0, mid),
            Wall::Top => DVec3::new(0.0, self.height / 2.0, mid),
            Wall::Left => DVec3::new(-self.width / 2.0, 0.0, mid),
            Wall::Right => DVec3::new(self.width / 2.0, 0.0, mid),
        };
        Plane::new(point, Self::wall_normal(wall))
    }

    fn on_wall(&self, wall: Wall, point: DVec3) -> bool {
        if point.z < 0.0 || point.z > self.length {
            return false;
        }
        match wall {
            Wall::Bottom | Wall::Top => point.x.abs() <= self.width / 2.0,
            Wall::Left | Wall::Right => point.y.abs() <= self.height / 2.0,
        }
    }

    /// Nearest wall the ray reaches next, ignoring the one it sits on
    fn next_hit(&self, origin: DVec3, direction: DVec3, skip: Option<Wall>) -> Option<(Wall, Hit)> {
        let mut closest: Option<(Wall, Hit)> = None;
        for wall in WALLS {
            if skip == Some(wall) {
                continue;
            }
            let Some(hit) = self.wall_plane(wall).intersect(origin, direction) else {
                continue;
            };
            if !self.on_wall(wall, hit.point) {
                continue;
            }
            if closest.map_or(true, |(_, best)| hit.t < best.t) {
                closest = Some((wall, hit));
            }
        }
        closest
    }

    fn channel(&self, ray: &mut Ray) -> Result<Interaction, RayError> {
        let mut reflections = 0;
        let mut last_wall = None;

        while reflections < MAX_GUIDE_REFLECTIONS {
            let origin = ray.origin()?;
            let direction = ray.direction();
            let Some((wall, hit)) = self.next_hit(origin, direction, last_wall) else {
                break;
            };
            ray.append_point(hit.point);
            ray.set_direction(reflect(direction, Self::wall_normal(wall)))?;
            reflections += 1;
            last_wall = Some(wall);
        }

        if reflections == MAX_GUIDE_REFLECTIONS {
            log::warn!(
                "ray stopped after {} guide reflections",
                MAX_GUIDE_REFLECTIONS
            );
        }
        Ok(Interaction::Guided { reflections })
    }
}

/// What a component did to a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interaction {
    Emitted,
    Advanced,
    PassedThrough,
    Missed,
    Reflected,
    Detected { ix: usize, iy: usize, weight: f64 },
    Guided { reflections: usize },
}

/// Component variants with their geometry
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentKind {
    Source(Source),
    Propagator(Propagator),
    Arm,
    Mirror(Mirror),
    Monitor(Monitor),
    Guide(Guide),
}

impl ComponentKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ComponentKind::Source(_) => "Source",
            ComponentKind::Propagator(_) => "Propagator",
            ComponentKind::Arm => "Arm",
            ComponentKind::Mirror(_) => "Mirror",
            ComponentKind::Monitor(_) => "Monitor",
            ComponentKind::Guide(_) => "Guide",
        }
    }

    /// Whether this component reads the ray's current position
    pub fn needs_origin(&self) -> bool {
        !matches!(self, ComponentKind::Source(_) | ComponentKind::Arm)
    }

    /// Act on a ray given in this component's local frame
    pub fn interact<R: Rng + ?Sized>(
        &self,
        ray: &mut Ray,
        rng: &mut R,
    ) -> Result<Interaction, RayError> {
        match self {
            ComponentKind::Source(source) => {
                source.emit(ray, rng)?;
                Ok(Interaction::Emitted)
            }
            ComponentKind::Propagator(propagator) => {
                let next = ray.origin()? + ray.direction() * propagator.distance;
                ray.append_point(next);
                Ok(Interaction::Advanced)
            }
            ComponentKind::Arm => Ok(Interaction::PassedThrough),
            ComponentKind::Mirror(mirror) => mirror.reflect_ray(ray),
            ComponentKind::Monitor(monitor) => monitor.detect(ray),
            ComponentKind::Guide(guide) => guide.channel(ray),
        }
    }

    /// Footprint polylines in the local frame
    pub fn outline(&self) -> Vec<Vec<DVec3>> {
        match self {
            ComponentKind::Source(Source { width, height, .. })
            | ComponentKind::Monitor(Monitor { width, height, .. }) => {
                vec![rectangle_xy(*width, *height, 0.0)]
            }
            ComponentKind::Propagator(Propagator { distance }) => {
                vec![vec![DVec3::ZERO, DVec3::Z * *distance]]
            }
            ComponentKind::Arm => Vec::new(),
            ComponentKind::Mirror(Mirror { width, height }) => {
                let (hw, hh) = (width / 2.0, height / 2.0);
                vec![vec![
                    DVec3::new(0.0, -hh, -hw),
                    DVec3::new(0.0, -hh, hw),
                    DVec3::new(0.0, hh, hw),
                    DVec3::new(0.0, hh, -hw),
                    DVec3::new(0.0, -hh, -hw),
                ]]
            }
            ComponentKind::Guide(Guide {
                width,
                height,
                length,
            }) => {
                let entry = rectangle_xy(*width, *height, 0.0);
                let exit = rectangle_xy(*width, *height, *length);
                let rails: Vec<Vec<DVec3>> = (0..4).map(|c| vec![entry[c], exit[c]]).collect();
                let mut edges = vec![entry, exit];
                edges.extend(rails);
                edges
            }
        }
    }
}

fn rectangle_xy(width: f64, height: f64, z: f64) -> Vec<DVec3> {
    let (hw, hh) = (width / 2.0, height / 2.0);
    vec![
        DVec3::new(-hw, -hh, z),
        DVec3::new(hw, -hh, z),
        DVec3::new(hw, hh, z),
        DVec3::new(-hw, hh, z),
        DVec3::new(-hw, -hh, z),
    ]
}

/// A placed component
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    pub kind: ComponentKind,
    /// Placement relative to the reference component it was added against
    pub local: Pose,
    /// Placement in the world frame, fixed at insertion
    pub global: Pose,
}

impl Component {
    pub fn monitor(&self) -> Option<&Monitor> {
        match &self.kind {
            ComponentKind::Monitor(monitor) => Some(monitor),
            _ => None,
        }
    }

    /// Footprint polylines in the world frame
    pub fn global_outline(&self) -> Vec<Vec<DVec3>> {
        self.kind
            .outline()
            .into_iter()
            .map(|line| {
                line.into_iter()
                    .map(|p| self.global.point_to_global(p))
                    .collect()
            })
            .collect()
    }
}
