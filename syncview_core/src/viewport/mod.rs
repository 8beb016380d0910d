//! Viewport module: the pane contract and its three variants.
//!
//! Every pane implements [`Viewport`]. Panes hold their shared state in
//! `Rc<RefCell<_>>` so their camera-bus listener (which holds only a weak
//! reference) can reach it. A pane never keeps that state borrowed while
//! emitting on the bus or calling a collaborator.

mod driver_signal;
mod local_renderer;
mod local_viewport;
mod remote_viewport;
mod delegate_viewport;

#[cfg(test)]
pub(crate) mod test_support;

use std::rc::Rc;
use std::time::Instant;
use bitflags::bitflags;
use crate::camera::CameraInput;
use crate::config::Color;
use crate::error::Result;
use crate::pose::CameraPose;
use crate::scene_config::SceneConfig;

pub use driver_signal::DriverRequestSignal;
pub use local_renderer::{LocalRenderer, METRICS_PLACEHOLDER};
pub use local_viewport::{LocalContent, LocalViewport, FALLBACK_STATUS};
pub use remote_viewport::{RemoteViewport, status as remote_status};
pub use delegate_viewport::{DelegateMode, DelegateViewport, status as delegate_status};

/// Backend family of a pane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewportKind {
    /// Renders itself with a local backend and camera
    Local,
    /// Pulls frames rendered by a remote server
    Remote,
    /// Wraps an optional third-party renderer, with a local fallback
    Delegate,
}

bitflags! {
    /// What a pane can meaningfully do. Unsupported operations are no-ops.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ViewportCapabilities: u32 {
        /// Produces authoritative poses when driver
        const DRIVE      = 1 << 0;
        const BACKGROUND = 1 << 1;
        const WIREFRAME  = 1 << 2;
        const QUALITY    = 1 << 3;
        /// Reports live frame metrics
        const METRICS    = 1 << 4;
    }
}

/// Contract every pane implements.
///
/// Lifecycle: `mount` once, any number of `attach_scene`, then `unmount`.
/// While mounted, the pane listens on the camera bus and applies an
/// incoming pose iff it is not driver and the pose was not emitted by
/// itself.
pub trait Viewport {
    /// Unique, stable pane id (also the bus source id of its poses)
    fn id(&self) -> &str;

    fn title(&self) -> &str;

    fn kind(&self) -> ViewportKind;

    fn capabilities(&self) -> ViewportCapabilities;

    // ===== LIFECYCLE =====

    /// Acquire backend resources and subscribe to the camera bus
    fn mount(&mut self) -> Result<()>;

    /// Release everything acquired by `mount` and leave the bus
    fn unmount(&mut self);

    fn is_mounted(&self) -> bool;

    /// Replace the attached scene and load its assets for this backend
    fn attach_scene(&mut self, scene: Rc<SceneConfig>);

    fn attached_scene(&self) -> Option<Rc<SceneConfig>>;

    // ===== ROLE =====

    fn set_driver(&mut self, is_driver: bool);

    fn is_driver(&self) -> bool;

    /// Human-readable role indicator
    fn role_label(&self) -> &'static str {
        if self.is_driver() { "Driver" } else { "Follower" }
    }

    /// Hook up the controller's driver-request queue
    fn connect_driver_signal(&mut self, signal: DriverRequestSignal);

    /// Ask the controller to make this pane the driver
    fn request_driver(&self);

    // ===== CAMERA =====

    /// Current camera, `None` when the backend cannot report one
    fn pose(&self) -> Option<CameraPose>;

    /// Snap the backend camera to `pose` without emitting it
    fn apply_pose(&mut self, pose: &CameraPose);

    /// Number of poses applied so far (bus deliveries and direct calls)
    fn applied_pose_count(&self) -> u64;

    /// User camera manipulation. A driver emits its resulting pose.
    fn handle_input(&mut self, input: CameraInput);

    // ===== APPEARANCE =====

    fn set_background(&mut self, color: Color);

    fn set_wireframe(&mut self, enabled: bool);

    /// Normalized quality level, clamped to 0..=1
    fn set_quality(&mut self, level: f32);

    // ===== FRAME LOOP & READOUTS =====

    /// Advance one display refresh
    fn tick(&mut self, now: Instant);

    /// Refresh the metrics readout
    fn update_metrics(&mut self);

    /// Display-only metrics string
    fn metrics(&self) -> String;

    /// Display-only status line (empty when there is nothing to report)
    fn status(&self) -> String;
}

#[cfg(test)]
#[path = "viewport_tests.rs"]
mod tests;
