use glam::DVec3;
use thiserror::Error;

/// Errors raised while mutating a ray
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RayError {
    #[error("degenerate ray direction ({x}, {y}, {z}) cannot be normalized")]
    DegenerateDirection { x: f64, y: f64, z: f64 },
    #[error("ray has no recorded position")]
    NoOrigin,
}

/// Display color of a ray path (sRGB)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RayColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RayColor {
    pub const GRAY: RayColor = RayColor::new(128, 128, 128);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for RayColor {
    fn default() -> Self {
        Self::GRAY
    }
}

/// A single traced particle: where it has been and where it is heading
#[derive(Debug, Clone, PartialEq)]
pub struct Ray {
    history: Vec<DVec3>,
    direction: DVec3,
    pub weight: f64,
    pub color: RayColor,
}

impl Ray {
    /// A fresh ray with no history, heading along +z with unit weight
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            direction: DVec3::Z,
            weight: 1.0,
            color: RayColor::default(),
        }
    }

    /// A ray starting at `origin` heading along `direction`
    pub fn from_origin(origin: DVec3, direction: DVec3) -> Result<Self, RayError> {
        let mut ray = Self::new();
        ray.set_direction(direction)?;
        ray.append_point(origin);
        Ok(ray)
    }

    pub fn append_point(&mut self, point: DVec3) {
        self.history.push(point);
    }

    /// Store `direction` scaled to unit length
    pub fn set_direction(&mut self, direction: DVec3) -> Result<(), RayError> {
        self.direction = direction
            .try_normalize()
            .ok_or(RayError::DegenerateDirection {
                x: direction.x,
                y: direction.y,
                z: direction.z,
            })?;
        Ok(())
    }

    pub fn history(&self) -> &[DVec3] {
        &self.history
    }

    pub fn direction(&self) -> DVec3 {
        self.direction
    }

    /// Current position of the ray, the last recorded point
    pub fn last_point(&self) -> Option<DVec3> {
        self.history.last().copied()
    }

    pub(crate) fn origin(&self) -> Result<DVec3, RayError> {
        self.last_point().ok_or(RayError::NoOrigin)
    }

    /// Apply an affine map to every history point and a linear map to the direction.
    ///
    /// Used for frame changes; the direction is renormalized afterwards so
    /// rounding never lets it drift off unit length.
    pub(crate) fn map_frame(
        &mut self,
        point_map: impl Fn(DVec3) -> DVec3,
        vector_map: impl Fn(DVec3) -> DVec3,
    ) -> Result<(), RayError> {
        for point in &mut self.history {
            *point = point_map(*point);
        }
        self.set_direction(vector_map(self.direction))
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self::new()
    }
}
