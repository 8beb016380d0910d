/// LocalRenderer: backend, orbit camera and installed object of one pane.
///
/// Shared by [`LocalViewport`](super::LocalViewport) and the fallback path
/// of [`DelegateViewport`](super::DelegateViewport).

use std::time::Instant;
use crate::backend::{FrameParams, FrameStats, GeometryHandle, RenderBackend};
use crate::camera::{Aabb, CameraInput, OrbitCamera};
use crate::config::Color;
use crate::error::Result;
use crate::geometry::Geometry;
use crate::pose::CameraPose;
use crate::scene_config::SceneConfig;

/// Metrics readout of a pane with nothing to measure (yet)
pub const METRICS_PLACEHOLDER: &str = "FPS: — | GPU: — | Prim: —";

/// A local render backend plus the camera and object it draws
pub struct LocalRenderer {
    backend: Box<dyn RenderBackend>,
    camera: OrbitCamera,
    object: Option<GeometryHandle>,
    primitives: u64,
    fps: Option<f32>,
    last_frame: Option<Instant>,
    last_stats: Option<FrameStats>,
    metrics: String,
}

impl LocalRenderer {
    /// Wrap a freshly created backend; the camera starts at the default pose
    pub fn new(mut backend: Box<dyn RenderBackend>, background: Color, point_size: f32) -> Self {
        backend.set_clear_color(background);
        backend.set_point_size(point_size);
        let (width, height) = backend.size();

        Self {
            backend,
            camera: OrbitCamera::new(aspect_of(width, height)),
            object: None,
            primitives: 0,
            fps: None,
            last_frame: None,
            last_stats: None,
            metrics: METRICS_PLACEHOLDER.to_string(),
        }
    }

    // ===== CAMERA =====

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn pose(&self) -> CameraPose {
        self.camera.pose()
    }

    pub fn apply_pose(&mut self, pose: &CameraPose) {
        self.camera.apply_pose(pose);
    }

    pub fn handle_input(&mut self, input: CameraInput) {
        self.camera.handle(input);
    }

    /// Realign the camera after an object was installed and framed.
    ///
    /// A driver takes the scene's initial camera when it declares one and
    /// returns the pose it now shows, for emission. A follower snaps back to
    /// the bus's latest pose so it stays synchronized; clip planes keep the
    /// values derived from the new object.
    pub fn settle_camera(
        &mut self,
        is_driver: bool,
        scene: Option<&SceneConfig>,
        latest: Option<CameraPose>,
    ) -> Option<CameraPose> {
        if is_driver {
            if let Some(initial) = scene.and_then(|s| s.initial_camera) {
                self.camera.apply_pose(&initial);
            }
            return Some(self.camera.pose());
        }
        if let Some(latest) = latest {
            self.camera.apply_pose(&latest);
        }
        None
    }

    // ===== OBJECT =====

    /// Replace the drawn object and fit the camera to it
    pub fn install(&mut self, geometry: &Geometry) -> Result<()> {
        if let Some(previous) = self.object.take() {
            self.backend.release(previous);
        }
        self.primitives = 0;

        let handle = self.backend.upload(geometry)?;
        self.object = Some(handle);
        self.primitives = geometry.primitive_count() as u64;

        let bounds = geometry
            .bounds()
            .unwrap_or_else(|| Aabb::new(glam::Vec3::ZERO, glam::Vec3::ZERO));
        self.camera.fit_to(&bounds);
        Ok(())
    }

    pub fn has_object(&self) -> bool {
        self.object.is_some()
    }

    /// Primitives of the installed object
    pub fn primitive_count(&self) -> u64 {
        self.primitives
    }

    // ===== APPEARANCE =====

    pub fn set_background(&mut self, color: Color) {
        self.backend.set_clear_color(color);
    }

    pub fn set_wireframe(&mut self, enabled: bool) {
        self.backend.set_wireframe(enabled);
    }

    pub fn set_point_size(&mut self, size: f32) {
        self.backend.set_point_size(size);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.backend.resize(width, height);
        self.camera.set_aspect(aspect_of(width, height));
    }

    // ===== FRAME LOOP =====

    /// Render one frame with the current camera
    pub fn frame(&mut self, now: Instant) -> Result<FrameStats> {
        if let Some(last) = self.last_frame {
            let dt = now.saturating_duration_since(last).as_secs_f32();
            if dt > 0.0 {
                self.fps = Some(1.0 / dt);
            }
        }
        self.last_frame = Some(now);

        let stats = self.backend.render(&FrameParams {
            view: self.camera.view_matrix(),
            projection: self.camera.projection_matrix(),
        })?;
        self.last_stats = Some(stats);
        Ok(stats)
    }

    /// Refresh the readout from the frame rate and the last frame's stats
    pub fn update_metrics(&mut self) {
        let gpu_bytes = self.last_stats.map_or(0, |stats| stats.gpu_bytes);
        self.metrics = match self.fps {
            Some(fps) => format!("FPS: {:.1} | GPU: {} | Prim: {}", fps, gpu_memory_label(gpu_bytes), self.primitives),
            None => METRICS_PLACEHOLDER.to_string(),
        };
    }

    pub fn metrics(&self) -> &str {
        &self.metrics
    }

    /// Release the object and the backend
    pub fn dispose(&mut self) {
        if let Some(handle) = self.object.take() {
            self.backend.release(handle);
        }
        self.backend.dispose();
    }
}

/// Backend geometry memory in whole kilobytes, "n/a" when nothing is resident
fn gpu_memory_label(bytes: u64) -> String {
    if bytes == 0 {
        return "n/a".to_string();
    }
    format!("{} KB", (bytes + 512) / 1024)
}

fn aspect_of(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

#[cfg(test)]
#[path = "local_renderer_tests.rs"]
mod tests;
