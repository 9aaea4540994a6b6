//! Rigid placements of components and the frame changes between them

use crate::ray::{Ray, RayError};
use glam::{DQuat, DVec3, EulerRot};

/// Position and orientation of a frame expressed in its parent frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: DVec3,
    pub rotation: DQuat,
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
    };

    pub fn new(position: DVec3, rotation: DQuat) -> Self {
        Self { position, rotation }
    }

    /// Build a pose from Euler angles in degrees, applied as intrinsic x, y, z rotations
    pub fn from_euler_degrees(position: DVec3, angles: DVec3) -> Self {
        let rotation = DQuat::from_euler(
            EulerRot::XYZ,
            angles.x.to_radians(),
            angles.y.to_radians(),
            angles.z.to_radians(),
        );
        Self { position, rotation }
    }

    /// Rotation of this pose as intrinsic x, y, z Euler angles in degrees
    pub fn euler_degrees(&self) -> DVec3 {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        DVec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
    }

    /// Place `local` (given relative to `self`) into the frame `self` lives in
    pub fn compose(&self, local: &Pose) -> Pose {
        Pose {
            position: self.position + self.rotation * local.position,
            rotation: (self.rotation * local.rotation).normalize(),
        }
    }

    pub fn point_to_local(&self, point: DVec3) -> DVec3 {
        self.rotation.inverse() * (point - self.position)
    }

    pub fn point_to_global(&self, point: DVec3) -> DVec3 {
        self.rotation * point + self.position
    }

    pub fn vector_to_local(&self, vector: DVec3) -> DVec3 {
        self.rotation.inverse() * vector
    }

    pub fn vector_to_global(&self, vector: DVec3) -> DVec3 {
        self.rotation * vector
    }

    /// Express a globally described ray in this frame
    pub fn ray_to_local(&self, ray: &mut Ray) -> Result<(), RayError> {
        let inverse = self.rotation.inverse();
        let position = self.position;
        ray.map_frame(|p| inverse * (p - position), |v| inverse * v)
    }

    /// Express a ray described in this frame in the enclosing global frame
    pub fn ray_to_global(&self, ray: &mut Ray) -> Result<(), RayError> {
        let rotation = self.rotation;
        let position = self.position;
        ray.map_frame(|p| rotation * p + position, |v| rotation * v)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: DVec3, b: DVec3) -> bool {
        a.abs_diff_eq(b, 1e-12)
    }

    #[test]
    fn test_rotation_about_y() {
        let pose = Pose::from_euler_degrees(DVec3::ZERO, DVec3::new(0.0, 90.0, 0.0));
        assert!(close(pose.vector_to_global(DVec3::Z), DVec3::X));
        assert!(close(pose.vector_to_global(DVec3::X), -DVec3::Z));
    }

    #[test]
    fn test_compose_adds_single_axis_angles() {
        let parent = Pose::from_euler_degrees(DVec3::new(1.0, 0.0, 0.0), DVec3::new(0.0, 30.0, 0.0));
        let child = Pose::from_euler_degrees(DVec3::new(0.0, 0.0, 2.0), DVec3::new(0.0, 45.0, 0.0));
        let global = parent.compose(&child);

        let expected = Pose::from_euler_degrees(DVec3::ZERO, DVec3::new(0.0, 75.0, 0.0));
        assert!(global.rotation.abs_diff_eq(expected.rotation, 1e-12));

        let offset = DVec3::new(2.0 * 30f64.to_radians().sin(), 0.0, 2.0 * 30f64.to_radians().cos());
        assert!(close(global.position, DVec3::new(1.0, 0.0, 0.0) + offset));
    }

    #[test]
    fn test_point_round_trip() {
        let pose = Pose::from_euler_degrees(DVec3::new(0.3, -2.0, 5.0), DVec3::new(10.0, -20.0, 130.0));
        let p = DVec3::new(-1.5, 0.25, 7.0);
        assert!(pose.point_to_global(pose.point_to_local(p)).abs_diff_eq(p, 1e-12));
    }

    #[test]
    fn test_euler_degrees_recovers_angles() {
        let angles = DVec3::new(12.0, -34.0, 56.0);
        let pose = Pose::from_euler_degrees(DVec3::ZERO, angles);
        assert!(pose.euler_degrees().abs_diff_eq(angles, 1e-9));
    }
}
