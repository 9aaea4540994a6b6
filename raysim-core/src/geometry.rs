use glam::DVec3;

/// Denominators below this magnitude mean the ray runs parallel to the plane
pub const PARALLEL_EPSILON: f64 = 1e-12;

/// An infinite plane given by a point on it and its normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub point: DVec3,
    pub normal: DVec3,
}

/// Where a ray meets a plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Distance along the (unit) ray direction
    pub t: f64,
    pub point: DVec3,
}

impl Plane {
    pub fn new(point: DVec3, normal: DVec3) -> Self {
        Self {
            point,
            normal: normal.normalize(),
        }
    }

    /// Intersect the ray `origin + t * direction` with this plane.
    ///
    /// Returns `None` when the ray is parallel to the plane or the plane
    /// lies behind the origin (`t < 0`).
    pub fn intersect(&self, origin: DVec3, direction: DVec3) -> Option<Hit> {
        let denom = direction.dot(self.normal);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = (self.point - origin).dot(self.normal) / denom;
        if t < 0.0 {
            return None;
        }
        Some(Hit {
            t,
            point: origin + direction * t,
        })
    }
}

/// Specular reflection of `direction` off a surface with unit `normal`
pub fn reflect(direction: DVec3, normal: DVec3) -> DVec3 {
    direction - 2.0 * direction.dot(normal) * normal
}
