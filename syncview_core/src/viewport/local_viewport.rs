/// LocalViewport: pane rendering a mesh or point cloud with its own camera.
///
/// The camera is live state: `pose()` reads it, `apply_pose()` snaps it.
/// On every scene attachment the declared asset is loaded; a failed or
/// missing asset is replaced by a deterministic procedural shape and the
/// camera is refit so the pane is never empty.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;
use crate::backend::BackendFactory;
use crate::bus::{CameraBus, PoseListener, SubscriptionKey};
use crate::camera::{CameraInput, OrbitCamera};
use crate::collaborators::{AssetKind, AssetLoader, LoadCallback};
use crate::config::{Color, ViewerConfig};
use crate::error::{Error, Result};
use crate::geometry::{fallback_mesh, fallback_points, Geometry};
use crate::pose::CameraPose;
use crate::scene_config::SceneConfig;
use crate::{viewer_debug, viewer_info, viewer_trace, viewer_warn};
use super::local_renderer::{LocalRenderer, METRICS_PLACEHOLDER};
use super::{DriverRequestSignal, Viewport, ViewportCapabilities, ViewportKind};

const LOG_SOURCE: &str = "syncview::LocalViewport";

/// Status shown while a procedural substitute stands in for the asset
pub const FALLBACK_STATUS: &str = "Showing fallback geometry.";

// ============================================================================
// CONTENT
// ============================================================================

/// What a local pane draws from the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalContent {
    /// `mesh` asset, triangle geometry
    Mesh,
    /// `pointCloud` asset, point geometry
    PointCloud,
}

impl LocalContent {
    pub fn asset_kind(self) -> AssetKind {
        match self {
            LocalContent::Mesh => AssetKind::Mesh,
            LocalContent::PointCloud => AssetKind::PointCloud,
        }
    }

    /// Asset reference the scene declares for this content
    pub fn asset_of(self, scene: &SceneConfig) -> Option<&str> {
        match self {
            LocalContent::Mesh => scene.mesh_asset(),
            LocalContent::PointCloud => scene.point_cloud_asset(),
        }
    }

    /// Deterministic substitute seeded by `seed`
    pub fn fallback(self, seed: &str) -> Geometry {
        match self {
            LocalContent::Mesh => fallback_mesh(seed),
            LocalContent::PointCloud => fallback_points(seed),
        }
    }

    pub fn capabilities(self) -> ViewportCapabilities {
        let common = ViewportCapabilities::DRIVE
            | ViewportCapabilities::BACKGROUND
            | ViewportCapabilities::METRICS;
        match self {
            LocalContent::Mesh => common | ViewportCapabilities::WIREFRAME,
            LocalContent::PointCloud => common | ViewportCapabilities::QUALITY,
        }
    }

    /// Loaded geometry, or the fallback when the load failed.
    ///
    /// Point clouds are recentred on the origin. The flag is true when the
    /// fallback was used.
    pub(crate) fn resolve(self, result: Result<Geometry>, seed: &str, viewport_id: &str) -> (Geometry, bool) {
        let (geometry, used_fallback) = match result {
            Ok(geometry) if !geometry.is_empty() => (geometry, false),
            Ok(_) => {
                viewer_warn!(LOG_SOURCE, "'{}': asset '{}' is empty, using fallback", viewport_id, seed);
                (self.fallback(seed), true)
            }
            Err(err) => {
                viewer_warn!(LOG_SOURCE, "'{}': {}, using fallback", viewport_id, err);
                (self.fallback(seed), true)
            }
        };
        match self {
            LocalContent::PointCloud => (geometry.centered(), used_fallback),
            LocalContent::Mesh => (geometry, used_fallback),
        }
    }
}

/// Point size for a normalized quality level
pub(crate) fn quality_point_size(level: f32) -> f32 {
    0.5 + 2.0 * level.clamp(0.0, 1.0)
}

// ============================================================================
// STATE
// ============================================================================

struct LocalState {
    content: LocalContent,
    mounted: bool,
    is_driver: bool,
    scene: Option<Rc<SceneConfig>>,
    renderer: Option<LocalRenderer>,
    subscription: Option<SubscriptionKey>,
    /// Bumped on every load and on unmount; stale completions are dropped
    load_generation: u64,
    status: String,
    applied: u64,
    background: Color,
    wireframe: bool,
    point_size: f32,
}

impl LocalState {
    fn apply_pose(&mut self, pose: &CameraPose) {
        self.applied += 1;
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.apply_pose(pose);
        }
    }

    /// Install the result of load `generation`. Returns the pose to emit, if any.
    fn finish_load(
        &mut self,
        generation: u64,
        seed: &str,
        result: Result<Geometry>,
        latest: Option<CameraPose>,
        viewport_id: &str,
    ) -> Option<CameraPose> {
        if !self.mounted || generation != self.load_generation {
            viewer_trace!(LOG_SOURCE, "'{}': dropping stale load of '{}'", viewport_id, seed);
            return None;
        }

        let (geometry, used_fallback) = self.content.resolve(result, seed, viewport_id);
        let renderer = self.renderer.as_mut()?;

        if let Err(err) = renderer.install(&geometry) {
            viewer_warn!(LOG_SOURCE, "'{}': could not upload '{}': {}", viewport_id, geometry.name(), err);
            self.status = "Failed to upload geometry.".to_string();
            return None;
        }
        let emit = renderer.settle_camera(self.is_driver, self.scene.as_deref(), latest);

        self.status = if used_fallback { FALLBACK_STATUS.to_string() } else { String::new() };
        viewer_debug!(LOG_SOURCE, "'{}': showing '{}' ({} primitives)",
            viewport_id, geometry.name(), geometry.primitive_count());
        emit
    }
}

// ============================================================================
// VIEWPORT
// ============================================================================

/// Pane with a local render backend and orbit camera
pub struct LocalViewport {
    id: String,
    title: String,
    bus: Rc<CameraBus>,
    loader: Rc<dyn AssetLoader>,
    factory: BackendFactory,
    driver_signal: Option<DriverRequestSignal>,
    state: Rc<RefCell<LocalState>>,
}

impl LocalViewport {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: LocalContent,
        bus: Rc<CameraBus>,
        loader: Rc<dyn AssetLoader>,
        factory: BackendFactory,
        config: &ViewerConfig,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            bus,
            loader,
            factory,
            driver_signal: None,
            state: Rc::new(RefCell::new(LocalState {
                content,
                mounted: false,
                is_driver: false,
                scene: None,
                renderer: None,
                subscription: None,
                load_generation: 0,
                status: String::new(),
                applied: 0,
                background: config.background,
                wireframe: false,
                point_size: config.point_size,
            })),
        }
    }

    pub fn content(&self) -> LocalContent {
        self.state.borrow().content
    }

    /// Copy of the live camera, `None` while unmounted
    pub fn camera(&self) -> Option<OrbitCamera> {
        self.state.borrow().renderer.as_ref().map(|r| r.camera().clone())
    }

    /// Primitives of the object currently shown
    pub fn primitive_count(&self) -> u64 {
        self.state.borrow().renderer.as_ref().map_or(0, LocalRenderer::primitive_count)
    }

    /// Resize the drawing surface
    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(renderer) = self.state.borrow_mut().renderer.as_mut() {
            renderer.resize(width, height);
        }
    }

    /// Bus listener: apply iff not driver and not our own pose
    fn listener(&self) -> PoseListener {
        let state = Rc::downgrade(&self.state);
        let own_id = self.id.clone();
        Box::new(move |pose, source_id| {
            let Some(state) = state.upgrade() else {
                return Ok(());
            };
            let mut state = state
                .try_borrow_mut()
                .map_err(|_| Error::BackendError(format!("'{}' busy while receiving a pose", own_id)))?;
            if state.is_driver || source_id == own_id {
                return Ok(());
            }
            state.apply_pose(pose);
            Ok(())
        })
    }

    /// Start loading the scene's asset for this pane
    fn load_scene_assets(&self, scene: &SceneConfig) {
        let (generation, content) = {
            let mut state = self.state.borrow_mut();
            if !state.mounted {
                return;
            }
            state.load_generation += 1;
            (state.load_generation, state.content)
        };

        let asset = content.asset_of(scene).map(str::to_string);
        let seed = asset.clone().unwrap_or_else(|| self.id.clone());
        let done = self.load_completion(generation, seed);

        match asset {
            Some(asset) => {
                viewer_debug!(LOG_SOURCE, "'{}': loading '{}'", self.id, asset);
                self.loader.load(&asset, content.asset_kind(), done);
            }
            None => done(Err(Error::AssetUnavailable(format!(
                "scene '{}' declares no {:?} asset", scene.name, content
            )))),
        }
    }

    fn load_completion(&self, generation: u64, seed: String) -> LoadCallback {
        let state = Rc::downgrade(&self.state);
        let bus = self.bus.clone();
        let id = self.id.clone();
        Box::new(move |result| {
            let Some(state) = state.upgrade() else {
                return;
            };
            let latest = bus.latest();
            let emit = match state.try_borrow_mut() {
                Ok(mut state) => state.finish_load(generation, &seed, result, latest, &id),
                Err(_) => {
                    viewer_warn!(LOG_SOURCE, "'{}': load of '{}' completed re-entrantly; dropped", id, seed);
                    None
                }
            };
            if let Some(pose) = emit {
                bus.emit(pose, &id);
            }
        })
    }
}

impl Viewport for LocalViewport {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn kind(&self) -> ViewportKind {
        ViewportKind::Local
    }

    fn capabilities(&self) -> ViewportCapabilities {
        self.content().capabilities()
    }

    fn mount(&mut self) -> Result<()> {
        if self.state.borrow().mounted {
            viewer_warn!(LOG_SOURCE, "'{}' is already mounted", self.id);
            return Ok(());
        }

        let backend = (self.factory)()
            .map_err(|err| Error::InitializationFailed(format!("viewport '{}': {}", self.id, err)))?;

        {
            let mut state = self.state.borrow_mut();
            let mut renderer = LocalRenderer::new(backend, state.background, state.point_size);
            if state.content == LocalContent::Mesh {
                renderer.set_wireframe(state.wireframe);
            }
            state.renderer = Some(renderer);
            state.mounted = true;
            state.status.clear();
        }

        let key = self.bus.subscribe(self.listener());
        self.state.borrow_mut().subscription = Some(key);

        let scene = self.state.borrow().scene.clone();
        if let Some(scene) = scene {
            self.load_scene_assets(&scene);
        }

        viewer_info!(LOG_SOURCE, "Mounted '{}'", self.id);
        Ok(())
    }

    fn unmount(&mut self) {
        let (subscription, renderer) = {
            let mut state = self.state.borrow_mut();
            if !state.mounted {
                return;
            }
            state.mounted = false;
            state.load_generation += 1;
            (state.subscription.take(), state.renderer.take())
        };

        if let Some(key) = subscription {
            self.bus.unsubscribe(key);
        }
        if let Some(mut renderer) = renderer {
            renderer.dispose();
        }
        viewer_info!(LOG_SOURCE, "Unmounted '{}'", self.id);
    }

    fn is_mounted(&self) -> bool {
        self.state.borrow().mounted
    }

    fn attach_scene(&mut self, scene: Rc<SceneConfig>) {
        self.state.borrow_mut().scene = Some(scene.clone());
        self.load_scene_assets(&scene);
    }

    fn attached_scene(&self) -> Option<Rc<SceneConfig>> {
        self.state.borrow().scene.clone()
    }

    fn set_driver(&mut self, is_driver: bool) {
        self.state.borrow_mut().is_driver = is_driver;
    }

    fn is_driver(&self) -> bool {
        self.state.borrow().is_driver
    }

    fn connect_driver_signal(&mut self, signal: DriverRequestSignal) {
        self.driver_signal = Some(signal);
    }

    fn request_driver(&self) {
        if let Some(signal) = &self.driver_signal {
            signal.request(&self.id);
        }
    }

    fn pose(&self) -> Option<CameraPose> {
        self.state.borrow().renderer.as_ref().map(LocalRenderer::pose)
    }

    fn apply_pose(&mut self, pose: &CameraPose) {
        self.state.borrow_mut().apply_pose(pose);
    }

    fn applied_pose_count(&self) -> u64 {
        self.state.borrow().applied
    }

    fn handle_input(&mut self, input: CameraInput) {
        let emit = {
            let mut state = self.state.borrow_mut();
            let is_driver = state.is_driver;
            let Some(renderer) = state.renderer.as_mut() else {
                return;
            };
            renderer.handle_input(input);
            let pose = renderer.pose();
            if is_driver { Some(pose) } else { None }
        };
        if let Some(pose) = emit {
            self.bus.emit(pose, &self.id);
        }
    }

    fn set_background(&mut self, color: Color) {
        let mut state = self.state.borrow_mut();
        state.background = color;
        if let Some(renderer) = state.renderer.as_mut() {
            renderer.set_background(color);
        }
    }

    fn set_wireframe(&mut self, enabled: bool) {
        let mut state = self.state.borrow_mut();
        if state.content != LocalContent::Mesh {
            return;
        }
        state.wireframe = enabled;
        if let Some(renderer) = state.renderer.as_mut() {
            renderer.set_wireframe(enabled);
        }
    }

    fn set_quality(&mut self, level: f32) {
        let mut state = self.state.borrow_mut();
        if state.content != LocalContent::PointCloud {
            return;
        }
        let size = quality_point_size(level);
        state.point_size = size;
        if let Some(renderer) = state.renderer.as_mut() {
            renderer.set_point_size(size);
        }
    }

    fn tick(&mut self, now: Instant) {
        let mut state = self.state.borrow_mut();
        if let Some(renderer) = state.renderer.as_mut() {
            if let Err(err) = renderer.frame(now) {
                viewer_warn!(LOG_SOURCE, "'{}': frame failed: {}", self.id, err);
            }
        }
    }

    fn update_metrics(&mut self) {
        if let Some(renderer) = self.state.borrow_mut().renderer.as_mut() {
            renderer.update_metrics();
        }
    }

    fn metrics(&self) -> String {
        self.state
            .borrow()
            .renderer
            .as_ref()
            .map_or_else(|| METRICS_PLACEHOLDER.to_string(), |r| r.metrics().to_string())
    }

    fn status(&self) -> String {
        self.state.borrow().status.clone()
    }
}

impl Drop for LocalViewport {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
#[path = "local_viewport_tests.rs"]
mod tests;
