/*!
# SyncView Core

Camera synchronization and viewport lifecycle for multi-pane 3D scene viewers.

Several independently rendered panes (mesh, point cloud, Gaussian splats,
server-streamed NeRF) display the same scene. One pane is the *driver*: its
camera motion is published on a [`CameraBus`](crate::bus::CameraBus) and every
other pane (a *follower*) applies it to its own backend.

## Architecture

- **CameraPose**: immutable camera snapshot copied on every transmission
- **CameraBus**: single-writer / many-reader pose channel with late-joiner replay
- **Scheduler**: cooperative single-threaded queue for deferred work
- **Viewport**: trait every pane implements (lifecycle, pose, appearance, metrics)
- **LocalViewport / RemoteViewport / DelegateViewport**: the three backend variants
- **ViewerController**: owns the panes, arbitrates the driver role, fans out commands

Rendering backends, asset decoders and remote renderers are consumed through
the collaborator traits in [`collaborators`](crate::collaborators).
*/

// Internal modules
mod error;
pub mod log;
pub mod config;
pub mod pose;
pub mod scene_config;
pub mod scheduler;
pub mod bus;
pub mod camera;
pub mod geometry;
pub mod backend;
pub mod collaborators;
pub mod viewport;
pub mod controller;

// Main syncview namespace module
pub mod syncview {
    // Error types
    pub use crate::error::{Error, Result};

    // Value types and configuration
    pub use crate::pose::CameraPose;
    pub use crate::config::{Color, ViewerConfig, RemoteConfig};
    pub use crate::scene_config::SceneConfig;

    // Synchronization
    pub use crate::scheduler::{Scheduler, TaskKey};
    pub use crate::bus::{CameraBus, PoseListener, SubscriptionKey, SCENE_SOURCE};

    // Coordinator
    pub use crate::controller::ViewerController;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, set_logger, reset_logger};
    }

    // Viewport sub-module
    pub mod viewport {
        pub use crate::viewport::*;
    }

    // Camera sub-module
    pub mod camera {
        pub use crate::camera::*;
    }

    // Geometry sub-module
    pub mod geometry {
        pub use crate::geometry::*;
    }

    // Backend sub-module
    pub mod backend {
        pub use crate::backend::*;
    }

    // Collaborator traits (asset loading, remote frames, delegate renderers)
    pub mod collaborators {
        pub use crate::collaborators::*;
    }
}

// Re-export math library at crate root
pub use glam;
