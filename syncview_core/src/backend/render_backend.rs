/// RenderBackend trait - drawing surface owned by one local viewport

use std::cell::RefCell;
use std::rc::Rc;
use glam::Mat4;
use slotmap::new_key_type;
use crate::config::Color;
use crate::error::Result;
use crate::geometry::Geometry;

// ============================================================================
// Common types
// ============================================================================

new_key_type! {
    /// Handle to geometry uploaded to a backend
    pub struct GeometryHandle;
}

/// Per-frame camera matrices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub view: Mat4,
    pub projection: Mat4,
}

/// Statistics of the last rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Number of draw calls this frame
    pub draw_calls: u32,
    /// Number of primitives (triangles or points) drawn this frame
    pub primitives: u64,
    /// Geometry memory held by the backend (bytes)
    pub gpu_bytes: u64,
}

/// Creates a fresh backend when a viewport mounts
pub type BackendFactory = Box<dyn Fn() -> Result<Box<dyn RenderBackend>>>;

// ============================================================================
// RenderBackend trait
// ============================================================================

/// Drawing surface of a local viewport.
///
/// A backend is exclusively owned by one viewport; it is created at mount
/// and disposed at unmount.
pub trait RenderBackend {
    /// Upload geometry and return a handle to draw it
    fn upload(&mut self, geometry: &Geometry) -> Result<GeometryHandle>;

    /// Release uploaded geometry. Unknown handles are ignored.
    fn release(&mut self, handle: GeometryHandle);

    fn set_clear_color(&mut self, color: Color);

    /// Draw triangle geometry as edges
    fn set_wireframe(&mut self, enabled: bool);

    /// Size of point primitives in pixels
    fn set_point_size(&mut self, size: f32);

    /// Resize the drawing surface
    fn resize(&mut self, width: u32, height: u32);

    /// Surface size in pixels
    fn size(&self) -> (u32, u32);

    /// Draw every uploaded geometry with the given camera
    fn render(&mut self, params: &FrameParams) -> Result<FrameStats>;

    /// Release every resource. The backend is unusable afterwards.
    fn dispose(&mut self);
}

// ============================================================================
// Shared backends
// ============================================================================

/// A backend shared with an observer (tests, diagnostics overlays).
///
/// The viewport still drives it exclusively; the observer only reads.
impl<B: RenderBackend> RenderBackend for Rc<RefCell<B>> {
    fn upload(&mut self, geometry: &Geometry) -> Result<GeometryHandle> {
        self.borrow_mut().upload(geometry)
    }

    fn release(&mut self, handle: GeometryHandle) {
        self.borrow_mut().release(handle)
    }

    fn set_clear_color(&mut self, color: Color) {
        self.borrow_mut().set_clear_color(color)
    }

    fn set_wireframe(&mut self, enabled: bool) {
        self.borrow_mut().set_wireframe(enabled)
    }

    fn set_point_size(&mut self, size: f32) {
        self.borrow_mut().set_point_size(size)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.borrow_mut().resize(width, height)
    }

    fn size(&self) -> (u32, u32) {
        self.borrow().size()
    }

    fn render(&mut self, params: &FrameParams) -> Result<FrameStats> {
        self.borrow_mut().render(params)
    }

    fn dispose(&mut self) {
        self.borrow_mut().dispose()
    }
}
