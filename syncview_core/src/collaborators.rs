//! External collaborators consumed by the viewports.
//!
//! - [`AssetLoader`]: resolves an asset reference to renderable geometry
//! - [`FrameTransport`]: fetches server-rendered frames for a camera pose
//! - [`DelegateProvider`] / [`DelegateRenderer`]: optional third-party renderer
//!
//! All completions are continuations. An implementation may invoke them
//! synchronously or later (e.g. from a [`Scheduler`] task); viewports
//! handle both.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;
use rustc_hash::FxHashMap;
use crate::config::Color;
use crate::error::{Error, Result};
use crate::geometry::Geometry;
use crate::pose::CameraPose;
use crate::scheduler::Scheduler;

// ============================================================================
// ASSET LOADING
// ============================================================================

/// What a viewport expects an asset reference to contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Mesh,
    PointCloud,
    Splats,
}

/// Continuation receiving the loaded geometry or the load failure
pub type LoadCallback = Box<dyn FnOnce(Result<Geometry>)>;

/// Resolves asset references (paths, URLs) to geometry
pub trait AssetLoader {
    /// Start loading `asset_ref`; `done` is called exactly once
    fn load(&self, asset_ref: &str, kind: AssetKind, done: LoadCallback);
}

/// Loader serving geometry registered in memory.
///
/// Unknown references fail with [`Error::AssetUnavailable`]. With a
/// scheduler, completions are deferred to the next drain instead of
/// running inside `load`.
#[derive(Default)]
pub struct MemoryAssetLoader {
    assets: FxHashMap<String, Geometry>,
    scheduler: Option<Rc<Scheduler>>,
    requested: RefCell<Vec<String>>,
}

impl MemoryAssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader whose completions run as deferred tasks on `scheduler`
    pub fn deferred(scheduler: Rc<Scheduler>) -> Self {
        Self {
            scheduler: Some(scheduler),
            ..Self::default()
        }
    }

    pub fn insert(&mut self, asset_ref: impl Into<String>, geometry: Geometry) {
        self.assets.insert(asset_ref.into(), geometry);
    }

    pub fn with(mut self, asset_ref: impl Into<String>, geometry: Geometry) -> Self {
        self.insert(asset_ref, geometry);
        self
    }

    /// Every reference passed to `load`, in call order
    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }
}

impl AssetLoader for MemoryAssetLoader {
    fn load(&self, asset_ref: &str, _kind: AssetKind, done: LoadCallback) {
        self.requested.borrow_mut().push(asset_ref.to_string());
        let result = self
            .assets
            .get(asset_ref)
            .cloned()
            .ok_or_else(|| Error::AssetUnavailable(asset_ref.to_string()));

        match &self.scheduler {
            Some(scheduler) => {
                scheduler.defer(move || done(result));
            }
            None => done(result),
        }
    }
}

// ============================================================================
// REMOTE FRAMES
// ============================================================================

/// One server-rendered frame request
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRequest {
    /// Server base URL, without trailing slash
    pub endpoint: String,
    pub pose: CameraPose,
    pub width: u32,
    pub height: u32,
    /// Monotonic per-viewport counter, also sent as cache-buster
    pub sequence: u64,
}

impl FrameRequest {
    /// Query parameters: pose (px..uz, fov), frame size (w, h), counter (t)
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let p = &self.pose;
        vec![
            ("px", p.position.x.to_string()),
            ("py", p.position.y.to_string()),
            ("pz", p.position.z.to_string()),
            ("tx", p.target.x.to_string()),
            ("ty", p.target.y.to_string()),
            ("tz", p.target.z.to_string()),
            ("ux", p.up.x.to_string()),
            ("uy", p.up.y.to_string()),
            ("uz", p.up.z.to_string()),
            ("fov", p.fov.to_string()),
            ("w", self.width.to_string()),
            ("h", self.height.to_string()),
            ("t", self.sequence.to_string()),
        ]
    }

    /// `{endpoint}/render?px=..&..&t=..`
    pub fn url(&self) -> String {
        let mut url = format!("{}/render?", self.endpoint);
        for (i, (key, value)) in self.query_pairs().iter().enumerate() {
            if i > 0 {
                url.push('&');
            }
            let _ = write!(url, "{}={}", key, value);
        }
        url
    }
}

/// Encoded image returned by the render server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Completion of a frame request
#[derive(Debug, Clone)]
pub struct FrameResponse {
    /// `FrameRequest::sequence` of the request this answers
    pub sequence: u64,
    pub result: Result<FrameImage>,
}

/// Asynchronous transport for frame requests.
///
/// Responses are pulled by the owning viewport on every tick.
pub trait FrameTransport {
    /// Start a request. An `Err` means it could not even be sent.
    fn request_frame(&mut self, request: FrameRequest) -> Result<()>;

    /// Next finished request, if any
    fn poll_response(&mut self) -> Option<FrameResponse>;

    /// Abandon a request. Its response, if it still arrives, may be dropped.
    fn cancel(&mut self, _sequence: u64) {}
}

// ============================================================================
// DELEGATE RENDERERS
// ============================================================================

/// Continuation receiving the acquired delegate, or why it is unavailable
pub type DelegateCallback = Box<dyn FnOnce(Result<Box<dyn DelegateRenderer>>)>;

/// Third-party renderer owning its own camera and surface
pub trait DelegateRenderer {
    /// Overwrite the delegate camera (position, look-at target, up, fov)
    fn set_camera(&mut self, pose: &CameraPose);

    /// Current delegate camera, if the delegate exposes it
    fn camera(&self) -> Option<CameraPose>;

    /// Load a splat scene. Fails for unreadable or corrupt assets.
    fn add_splat_scene(&mut self, asset_ref: &str) -> Result<()>;

    fn set_background(&mut self, color: Color);

    /// Ask for a redraw after state changes
    fn request_render(&mut self);

    fn dispose(&mut self);
}

/// Acquires the optional delegate renderer
pub trait DelegateProvider {
    /// Start acquisition; `done` is called exactly once
    fn acquire(&self, done: DelegateCallback);
}

/// Provider for builds without a delegate renderer
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableDelegate;

impl DelegateProvider for UnavailableDelegate {
    fn acquire(&self, done: DelegateCallback) {
        done(Err(Error::DelegateUnavailable("no splat renderer in this build".to_string())));
    }
}

#[cfg(test)]
#[path = "collaborators_tests.rs"]
mod tests;
