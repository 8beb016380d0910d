/// Backend module - render backend trait used by local viewports

// Module declarations
pub mod render_backend;
pub mod headless_backend;

// Re-export everything from render_backend.rs
pub use render_backend::*;
pub use headless_backend::HeadlessBackend;

/// Factory creating a [`HeadlessBackend`] of the given surface size per mount
pub fn headless_factory(width: u32, height: u32) -> BackendFactory {
    Box::new(move || Ok(Box::new(HeadlessBackend::new(width, height)) as Box<dyn RenderBackend>))
}
