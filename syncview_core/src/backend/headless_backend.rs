/// Headless render backend (no GPU required)
///
/// Tracks uploaded geometry and appearance state, and records every call
/// as a command string so tests and the demo can observe what a pane did.

use slotmap::SlotMap;
use crate::backend::{FrameParams, FrameStats, GeometryHandle, RenderBackend};
use crate::config::Color;
use crate::error::Result;
use crate::geometry::Geometry;
use crate::viewer_bail;

#[derive(Debug, Clone)]
struct UploadedGeometry {
    name: String,
    primitives: u64,
    bytes: u64,
}

/// Backend that renders nowhere
#[derive(Debug)]
pub struct HeadlessBackend {
    geometries: SlotMap<GeometryHandle, UploadedGeometry>,
    clear_color: Color,
    wireframe: bool,
    point_size: f32,
    width: u32,
    height: u32,
    disposed: bool,
    frames: u64,
    /// Every call, in order (e.g. "upload demo_mesh", "render 1")
    pub commands: Vec<String>,
}

impl HeadlessBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            geometries: SlotMap::with_key(),
            clear_color: Color::default(),
            wireframe: false,
            point_size: 1.0,
            width,
            height,
            disposed: false,
            frames: 0,
            commands: Vec::new(),
        }
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl RenderBackend for HeadlessBackend {
    fn upload(&mut self, geometry: &Geometry) -> Result<GeometryHandle> {
        if self.disposed {
            viewer_bail!("syncview::HeadlessBackend", "Upload of '{}' after dispose", geometry.name());
        }
        self.commands.push(format!("upload {}", geometry.name()));
        Ok(self.geometries.insert(UploadedGeometry {
            name: geometry.name().to_string(),
            primitives: geometry.primitive_count() as u64,
            bytes: geometry.byte_size() as u64,
        }))
    }

    fn release(&mut self, handle: GeometryHandle) {
        if let Some(geometry) = self.geometries.remove(handle) {
            self.commands.push(format!("release {}", geometry.name));
        }
    }

    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
        self.commands.push(format!("clear_color {}", color));
    }

    fn set_wireframe(&mut self, enabled: bool) {
        self.wireframe = enabled;
        self.commands.push(format!("wireframe {}", enabled));
    }

    fn set_point_size(&mut self, size: f32) {
        self.point_size = size;
        self.commands.push(format!("point_size {}", size));
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.commands.push(format!("resize {}x{}", width, height));
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn render(&mut self, params: &FrameParams) -> Result<FrameStats> {
        if self.disposed {
            viewer_bail!("syncview::HeadlessBackend", "Render after dispose");
        }
        if !params.view.is_finite() || !params.projection.is_finite() {
            viewer_bail!("syncview::HeadlessBackend", "Non-finite camera matrices");
        }

        self.frames += 1;
        self.commands.push(format!("render {}", self.frames));

        Ok(FrameStats {
            draw_calls: self.geometries.len() as u32,
            primitives: self.geometries.values().map(|g| g.primitives).sum(),
            gpu_bytes: self.geometries.values().map(|g| g.bytes).sum(),
        })
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.geometries.clear();
        self.disposed = true;
        self.commands.push("dispose".to_string());
    }
}

#[cfg(test)]
#[path = "headless_backend_tests.rs"]
mod tests;
