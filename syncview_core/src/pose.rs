/// CameraPose: immutable snapshot of a virtual camera.
///
/// Produced by whichever pane holds the driver role, copied to every
/// follower. A pose is never mutated after construction; receivers get
/// their own copy.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Camera position, look-target, up vector and vertical field of view.
///
/// `up` must not be parallel to `target - position`. The bus does not
/// validate this; [`CameraPose::is_degenerate`] lets callers check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub fov: f32,
}

impl CameraPose {
    pub fn new(position: Vec3, target: Vec3, up: Vec3, fov: f32) -> Self {
        Self { position, target, up, fov }
    }

    /// Build a pose from plain arrays, as carried by scene descriptors
    pub fn from_arrays(position: [f32; 3], target: [f32; 3], up: [f32; 3], fov: f32) -> Self {
        Self::new(Vec3::from(position), Vec3::from(target), Vec3::from(up), fov)
    }

    /// Unit view direction (zero when position == target)
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Distance between camera and look-target
    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    /// True when the orientation cannot be built (coincident points or up ∥ view)
    pub fn is_degenerate(&self) -> bool {
        let forward = self.forward();
        forward == Vec3::ZERO || forward.cross(self.up.normalize_or_zero()).length_squared() < 1e-12
    }
}

impl Default for CameraPose {
    /// The viewer's start-up camera: (2,2,2) looking at the origin, 60°
    fn default() -> Self {
        Self::new(Vec3::splat(2.0), Vec3::ZERO, Vec3::Y, 60.0)
    }
}

#[cfg(test)]
#[path = "pose_tests.rs"]
mod tests;
