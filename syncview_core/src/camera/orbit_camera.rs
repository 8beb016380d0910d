/// Orbit camera: position/target/up state driven by user input.
///
/// Unlike a passive matrix container, this camera owns its pose and
/// derives view and projection matrices on demand.

use glam::{Mat4, Quat, Vec3};
use crate::pose::CameraPose;
use super::bounds::{fit_to_view, Aabb};

/// Closest the camera may get to its target
const MIN_DISTANCE: f32 = 1e-3;

/// Smallest angle (radians) kept between the view direction and `up`
const POLE_MARGIN: f32 = 0.01;

/// User camera manipulation, already converted from device events
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraInput {
    /// Rotate around the target (radians)
    Orbit { yaw: f32, pitch: f32 },
    /// Translate camera and target in the view plane, in units of target distance
    Pan { right: f32, up: f32 },
    /// Scale distance to the target (< 1 moves closer)
    Zoom { factor: f32 },
}

/// Perspective orbit camera
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    position: Vec3,
    target: Vec3,
    up: Vec3,
    fov_deg: f32,
    near: f32,
    far: f32,
    aspect: f32,
}

impl OrbitCamera {
    pub fn new(aspect: f32) -> Self {
        Self::from_pose(&CameraPose::default(), aspect)
    }

    pub fn from_pose(pose: &CameraPose, aspect: f32) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_deg: 60.0,
            near: 0.01,
            far: 1000.0,
            aspect: sanitize_aspect(aspect),
        };
        camera.apply_pose(pose);
        camera
    }

    // ===== POSE =====

    /// Current pose (position, target, up, vertical fov in degrees)
    pub fn pose(&self) -> CameraPose {
        CameraPose::new(self.position, self.target, self.up, self.fov_deg)
    }

    /// Snap to `pose`. Degenerate components (zero up vector, non-positive fov)
    /// keep their previous value.
    pub fn apply_pose(&mut self, pose: &CameraPose) {
        self.position = pose.position;
        self.target = pose.target;
        if let Some(up) = pose.up.try_normalize() {
            self.up = up;
        }
        if pose.fov.is_finite() && pose.fov > 0.0 && pose.fov < 180.0 {
            self.fov_deg = pose.fov;
        }
    }

    /// Reposition to frame `bounds` and adjust clip planes
    pub fn fit_to(&mut self, bounds: &Aabb) {
        let fit = fit_to_view(bounds);
        self.position = fit.position;
        self.target = fit.target;
        self.near = fit.near;
        self.far = fit.far;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn fov_degrees(&self) -> f32 {
        self.fov_deg
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = sanitize_aspect(aspect);
    }

    // ===== INPUT =====

    /// Apply one input step
    pub fn handle(&mut self, input: CameraInput) {
        match input {
            CameraInput::Orbit { yaw, pitch } => self.orbit(yaw, pitch),
            CameraInput::Pan { right, up } => self.pan(right, up),
            CameraInput::Zoom { factor } => self.zoom(factor),
        }
    }

    fn orbit(&mut self, yaw: f32, pitch: f32) {
        let offset = self.position - self.target;
        let distance = offset.length();
        if distance < MIN_DISTANCE {
            return;
        }

        // Yaw around up, then pitch around the camera's right axis
        let yawed = Quat::from_axis_angle(self.up, yaw) * offset;

        let current = yawed.normalize().dot(self.up).clamp(-1.0, 1.0).acos();
        let max_pitch = current - POLE_MARGIN;
        let min_pitch = current - (std::f32::consts::PI - POLE_MARGIN);
        let pitch = pitch.clamp(min_pitch, max_pitch);

        let rotated = match self.up.cross(yawed).try_normalize() {
            Some(right) => Quat::from_axis_angle(right, -pitch) * yawed,
            None => yawed,
        };

        self.position = self.target + rotated.normalize() * distance;
    }

    fn pan(&mut self, right: f32, up: f32) {
        let distance = (self.position - self.target).length().max(MIN_DISTANCE);
        let forward = (self.target - self.position).normalize_or_zero();
        let Some(right_axis) = forward.cross(self.up).try_normalize() else {
            return;
        };
        let up_axis = right_axis.cross(forward);

        let delta = (right_axis * right + up_axis * up) * distance;
        self.position += delta;
        self.target += delta;
    }

    fn zoom(&mut self, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let offset = self.position - self.target;
        let distance = (offset.length() * factor).max(MIN_DISTANCE);
        if let Some(direction) = offset.try_normalize() {
            self.position = self.target + direction * distance;
        }
    }

    // ===== MATRICES =====

    /// Right-handed view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Right-handed perspective projection
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_deg.to_radians(), self.aspect, self.near, self.far)
    }
}

fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 }
}

#[cfg(test)]
#[path = "orbit_camera_tests.rs"]
mod tests;
