//! Camera module: orbit camera, bounding boxes and fit-to-view.
//!
//! The orbit camera is the local camera state of panes that render
//! themselves. Pull-based panes have no camera at all.

mod bounds;
mod orbit_camera;

pub use bounds::{Aabb, CameraFit, fit_to_view};
pub use orbit_camera::{OrbitCamera, CameraInput};
