/// DelegateViewport: pane wrapping an optional third-party splat renderer.
///
/// The delegate is acquired asynchronously at mount. Until it resolves,
/// scene attachment and incoming poses are buffered. When acquisition
/// fails, when the delegate rejects the splat scene, or when the scene has
/// no splats, the pane switches for good to a local point renderer fed
/// with the scene's point cloud.

use std::cell::RefCell;
use std::mem;
use std::rc::Rc;
use std::time::Instant;
use crate::backend::BackendFactory;
use crate::bus::{CameraBus, PoseListener, SubscriptionKey};
use crate::camera::{CameraInput, OrbitCamera};
use crate::collaborators::{
    AssetKind, AssetLoader, DelegateCallback, DelegateProvider, DelegateRenderer, LoadCallback,
};
use crate::config::{Color, ViewerConfig};
use crate::error::{Error, Result};
use crate::pose::CameraPose;
use crate::scene_config::SceneConfig;
use crate::{viewer_debug, viewer_info, viewer_trace, viewer_warn};
use super::local_renderer::{LocalRenderer, METRICS_PLACEHOLDER};
use super::local_viewport::{quality_point_size, LocalContent};
use super::{DriverRequestSignal, Viewport, ViewportCapabilities, ViewportKind};

const LOG_SOURCE: &str = "syncview::DelegateViewport";

/// Status lines shown by a delegate pane
pub mod status {
    pub const WAITING: &str = "Waiting for splat file…";
    pub const NO_SCENE: &str = "No splat scene loaded.";
    pub const USING_FALLBACK: &str = "Using fallback points (splat renderer unavailable).";
    pub const SPLAT_LOAD_FAILED: &str = "Failed to load splat PLY; falling back to points.";
    pub const FALLBACK_RENDERER: &str = "Fallback point renderer (approx splats)";
    pub const NO_ASSET: &str = "No splat or point-cloud asset provided.";
    pub const FALLBACK_LOAD_FAILED: &str = "Failed to load PLY for fallback.";
}

/// Which backend currently serves the pane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegateMode {
    Detached,
    Acquiring,
    Ready,
    Fallback,
}

enum Backend {
    Detached,
    Acquiring,
    Ready(Box<dyn DelegateRenderer>),
    /// `None` when the fallback backend could not be created
    Fallback(Option<LocalRenderer>),
}

struct DelegateState {
    backend: Backend,
    mounted: bool,
    is_driver: bool,
    scene: Option<Rc<SceneConfig>>,
    /// Latest pose received while the delegate was being acquired
    pending_pose: Option<CameraPose>,
    subscription: Option<SubscriptionKey>,
    load_generation: u64,
    status: String,
    applied: u64,
    background: Color,
    point_size: f32,
}

impl DelegateState {
    fn apply_pose(&mut self, pose: &CameraPose) {
        self.applied += 1;
        match &mut self.backend {
            Backend::Ready(delegate) => {
                delegate.set_camera(pose);
                delegate.request_render();
            }
            Backend::Fallback(Some(renderer)) => renderer.apply_pose(pose),
            Backend::Detached | Backend::Acquiring => self.pending_pose = Some(*pose),
            Backend::Fallback(None) => {}
        }
    }

    fn pose(&self) -> Option<CameraPose> {
        match &self.backend {
            Backend::Ready(delegate) => delegate.camera(),
            Backend::Fallback(Some(renderer)) => Some(renderer.pose()),
            _ => None,
        }
    }

    fn release_backend(&mut self) {
        match mem::replace(&mut self.backend, Backend::Detached) {
            Backend::Ready(mut delegate) => delegate.dispose(),
            Backend::Fallback(Some(mut renderer)) => renderer.dispose(),
            _ => {}
        }
    }
}

/// What attaching a scene requires once the state borrow is released
enum AttachOutcome {
    Done,
    EnterFallback(&'static str),
    ReloadFallback,
}

/// State reachable from bus listeners and collaborator continuations
struct Shared {
    id: String,
    bus: Rc<CameraBus>,
    loader: Rc<dyn AssetLoader>,
    factory: BackendFactory,
    state: RefCell<DelegateState>,
}

impl Shared {
    fn on_acquired(self: &Rc<Self>, result: Result<Box<dyn DelegateRenderer>>) {
        let scene = {
            let mut state = self.state.borrow_mut();
            if !matches!(state.backend, Backend::Acquiring) {
                if let Ok(mut delegate) = result {
                    viewer_debug!(LOG_SOURCE, "'{}': delegate arrived after unmount; disposed", self.id);
                    delegate.dispose();
                }
                return;
            }

            match result {
                Ok(mut delegate) => {
                    viewer_info!(LOG_SOURCE, "'{}': splat renderer ready", self.id);
                    delegate.set_background(state.background);
                    if let Some(pose) = state.pending_pose.take() {
                        delegate.set_camera(&pose);
                    }
                    delegate.request_render();
                    state.backend = Backend::Ready(delegate);
                    state.status = status::NO_SCENE.to_string();
                    state.scene.clone()
                }
                Err(err) => {
                    viewer_warn!(LOG_SOURCE, "'{}': {}; using fallback points", self.id, err);
                    drop(state);
                    self.enter_fallback(status::USING_FALLBACK);
                    return;
                }
            }
        };

        if let Some(scene) = scene {
            self.attach(&scene);
        }
    }

    /// Hand the scene to whichever backend is active
    fn attach(self: &Rc<Self>, scene: &SceneConfig) {
        let outcome = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            match &mut state.backend {
                Backend::Detached | Backend::Acquiring => AttachOutcome::Done,
                Backend::Ready(delegate) => match scene.splat_asset() {
                    Some(asset) => match delegate.add_splat_scene(asset) {
                        Ok(()) => {
                            viewer_debug!(LOG_SOURCE, "'{}': splat scene '{}' loaded", self.id, asset);
                            delegate.request_render();
                            state.status.clear();
                            AttachOutcome::Done
                        }
                        Err(err) => {
                            viewer_warn!(LOG_SOURCE, "'{}': splat scene rejected: {}", self.id, err);
                            AttachOutcome::EnterFallback(status::SPLAT_LOAD_FAILED)
                        }
                    },
                    None => AttachOutcome::EnterFallback(status::FALLBACK_RENDERER),
                },
                Backend::Fallback(_) => {
                    state.status = status::FALLBACK_RENDERER.to_string();
                    AttachOutcome::ReloadFallback
                }
            }
        };

        match outcome {
            AttachOutcome::Done => {}
            AttachOutcome::EnterFallback(reason) => self.enter_fallback(reason),
            AttachOutcome::ReloadFallback => self.load_fallback(scene),
        }
    }

    /// Switch to the local point renderer for the rest of the pane's life
    fn enter_fallback(self: &Rc<Self>, reason: &'static str) {
        let scene = {
            let mut state = self.state.borrow_mut();
            if !state.mounted || matches!(state.backend, Backend::Fallback(_)) {
                return;
            }
            state.release_backend();

            let renderer = match (self.factory)() {
                Ok(backend) => {
                    let mut renderer = LocalRenderer::new(backend, state.background, state.point_size);
                    if let Some(pose) = state.pending_pose.take() {
                        renderer.apply_pose(&pose);
                    }
                    Some(renderer)
                }
                Err(err) => {
                    viewer_warn!(LOG_SOURCE, "'{}': fallback renderer unavailable: {}", self.id, err);
                    None
                }
            };
            state.backend = Backend::Fallback(renderer);
            state.status = reason.to_string();
            state.scene.clone()
        };

        if let Some(scene) = scene {
            self.load_fallback(&scene);
        }
    }

    fn load_fallback(self: &Rc<Self>, scene: &SceneConfig) {
        let generation = {
            let mut state = self.state.borrow_mut();
            state.load_generation += 1;
            state.load_generation
        };

        let declared = scene
            .point_cloud_asset()
            .map(|asset| (asset.to_string(), AssetKind::PointCloud))
            .or_else(|| scene.splat_asset().map(|asset| (asset.to_string(), AssetKind::Splats)));

        match declared {
            Some((asset, kind)) => {
                viewer_debug!(LOG_SOURCE, "'{}': fallback loading '{}'", self.id, asset);
                let done = self.fallback_completion(generation, asset.clone(), true);
                self.loader.load(&asset, kind, done);
            }
            None => {
                self.state.borrow_mut().status = status::NO_ASSET.to_string();
                let done = self.fallback_completion(generation, self.id.clone(), false);
                done(Err(Error::AssetUnavailable(format!("scene '{}' declares no points", scene.name))));
            }
        }
    }

    fn fallback_completion(self: &Rc<Self>, generation: u64, seed: String, declared: bool) -> LoadCallback {
        let shared = Rc::downgrade(self);
        Box::new(move |result| {
            if let Some(shared) = shared.upgrade() {
                shared.finish_fallback_load(generation, &seed, declared, result);
            }
        })
    }

    fn finish_fallback_load(&self, generation: u64, seed: &str, declared: bool, result: Result<crate::geometry::Geometry>) {
        let latest = self.bus.latest();
        let emit = {
            let Ok(mut guard) = self.state.try_borrow_mut() else {
                viewer_warn!(LOG_SOURCE, "'{}': load of '{}' completed re-entrantly; dropped", self.id, seed);
                return;
            };
            let state = &mut *guard;
            if !state.mounted || generation != state.load_generation {
                viewer_trace!(LOG_SOURCE, "'{}': dropping stale load of '{}'", self.id, seed);
                return;
            }
            let Backend::Fallback(Some(renderer)) = &mut state.backend else {
                return;
            };

            let (geometry, used_fallback) = LocalContent::PointCloud.resolve(result, seed, &self.id);
            if let Err(err) = renderer.install(&geometry) {
                viewer_warn!(LOG_SOURCE, "'{}': could not upload '{}': {}", self.id, geometry.name(), err);
                return;
            }
            let emit = renderer.settle_camera(state.is_driver, state.scene.as_deref(), latest);
            if used_fallback && declared {
                state.status = status::FALLBACK_LOAD_FAILED.to_string();
            }
            emit
        };

        if let Some(pose) = emit {
            self.bus.emit(pose, &self.id);
        }
    }
}

/// Pane forwarding to a delegate renderer, with a local point fallback
pub struct DelegateViewport {
    title: String,
    provider: Rc<dyn DelegateProvider>,
    driver_signal: Option<DriverRequestSignal>,
    shared: Rc<Shared>,
}

impl DelegateViewport {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        bus: Rc<CameraBus>,
        provider: Rc<dyn DelegateProvider>,
        loader: Rc<dyn AssetLoader>,
        factory: BackendFactory,
        config: &ViewerConfig,
    ) -> Self {
        Self {
            title: title.into(),
            provider,
            driver_signal: None,
            shared: Rc::new(Shared {
                id: id.into(),
                bus,
                loader,
                factory,
                state: RefCell::new(DelegateState {
                    backend: Backend::Detached,
                    mounted: false,
                    is_driver: false,
                    scene: None,
                    pending_pose: None,
                    subscription: None,
                    load_generation: 0,
                    status: String::new(),
                    applied: 0,
                    background: config.background,
                    point_size: config.point_size,
                }),
            }),
        }
    }

    pub fn mode(&self) -> DelegateMode {
        match self.shared.state.borrow().backend {
            Backend::Detached => DelegateMode::Detached,
            Backend::Acquiring => DelegateMode::Acquiring,
            Backend::Ready(_) => DelegateMode::Ready,
            Backend::Fallback(_) => DelegateMode::Fallback,
        }
    }

    /// Primitives drawn by the fallback renderer (0 otherwise)
    pub fn fallback_primitive_count(&self) -> u64 {
        match &self.shared.state.borrow().backend {
            Backend::Fallback(Some(renderer)) => renderer.primitive_count(),
            _ => 0,
        }
    }

    fn acquisition_callback(&self) -> DelegateCallback {
        let shared = Rc::downgrade(&self.shared);
        Box::new(move |result| {
            if let Some(shared) = shared.upgrade() {
                shared.on_acquired(result);
            } else if let Ok(mut delegate) = result {
                delegate.dispose();
            }
        })
    }

    fn listener(&self) -> PoseListener {
        let shared = Rc::downgrade(&self.shared);
        Box::new(move |pose, source_id| {
            let Some(shared) = shared.upgrade() else {
                return Ok(());
            };
            let mut state = shared
                .state
                .try_borrow_mut()
                .map_err(|_| Error::BackendError(format!("'{}' busy while receiving a pose", shared.id)))?;
            if state.is_driver || source_id == shared.id {
                return Ok(());
            }
            state.apply_pose(pose);
            Ok(())
        })
    }
}

impl Viewport for DelegateViewport {
    fn id(&self) -> &str {
        &self.shared.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn kind(&self) -> ViewportKind {
        ViewportKind::Delegate
    }

    fn capabilities(&self) -> ViewportCapabilities {
        let base = ViewportCapabilities::DRIVE
            | ViewportCapabilities::BACKGROUND
            | ViewportCapabilities::QUALITY;
        match self.mode() {
            DelegateMode::Fallback => base | ViewportCapabilities::METRICS,
            _ => base,
        }
    }

    fn mount(&mut self) -> Result<()> {
        {
            let mut state = self.shared.state.borrow_mut();
            if state.mounted {
                viewer_warn!(LOG_SOURCE, "'{}' is already mounted", self.shared.id);
                return Ok(());
            }
            state.mounted = true;
            state.backend = Backend::Acquiring;
            state.status = status::WAITING.to_string();
        }

        let key = self.shared.bus.subscribe(self.listener());
        self.shared.state.borrow_mut().subscription = Some(key);

        viewer_info!(LOG_SOURCE, "Mounted '{}', acquiring splat renderer", self.shared.id);
        self.provider.acquire(self.acquisition_callback());
        Ok(())
    }

    fn unmount(&mut self) {
        let subscription = {
            let mut state = self.shared.state.borrow_mut();
            if !state.mounted {
                return;
            }
            state.mounted = false;
            state.load_generation += 1;
            state.pending_pose = None;
            state.release_backend();
            state.subscription.take()
        };
        if let Some(key) = subscription {
            self.shared.bus.unsubscribe(key);
        }
        viewer_info!(LOG_SOURCE, "Unmounted '{}'", self.shared.id);
    }

    fn is_mounted(&self) -> bool {
        self.shared.state.borrow().mounted
    }

    fn attach_scene(&mut self, scene: Rc<SceneConfig>) {
        self.shared.state.borrow_mut().scene = Some(scene.clone());
        self.shared.attach(&scene);
    }

    fn attached_scene(&self) -> Option<Rc<SceneConfig>> {
        self.shared.state.borrow().scene.clone()
    }

    fn set_driver(&mut self, is_driver: bool) {
        self.shared.state.borrow_mut().is_driver = is_driver;
    }

    fn is_driver(&self) -> bool {
        self.shared.state.borrow().is_driver
    }

    fn connect_driver_signal(&mut self, signal: DriverRequestSignal) {
        self.driver_signal = Some(signal);
    }

    fn request_driver(&self) {
        if let Some(signal) = &self.driver_signal {
            signal.request(&self.shared.id);
        }
    }

    fn pose(&self) -> Option<CameraPose> {
        self.shared.state.borrow().pose()
    }

    fn apply_pose(&mut self, pose: &CameraPose) {
        self.shared.state.borrow_mut().apply_pose(pose);
    }

    fn applied_pose_count(&self) -> u64 {
        self.shared.state.borrow().applied
    }

    fn handle_input(&mut self, input: CameraInput) {
        let emit = {
            let mut state = self.shared.state.borrow_mut();
            let is_driver = state.is_driver;
            let pose = match &mut state.backend {
                Backend::Ready(delegate) => delegate.camera().map(|current| {
                    let mut camera = OrbitCamera::from_pose(&current, 1.0);
                    camera.handle(input);
                    let pose = camera.pose();
                    delegate.set_camera(&pose);
                    delegate.request_render();
                    pose
                }),
                Backend::Fallback(Some(renderer)) => {
                    renderer.handle_input(input);
                    Some(renderer.pose())
                }
                _ => None,
            };
            if is_driver { pose } else { None }
        };
        if let Some(pose) = emit {
            self.shared.bus.emit(pose, &self.shared.id);
        }
    }

    fn set_background(&mut self, color: Color) {
        let mut state = self.shared.state.borrow_mut();
        state.background = color;
        match &mut state.backend {
            Backend::Ready(delegate) => {
                delegate.set_background(color);
                delegate.request_render();
            }
            Backend::Fallback(Some(renderer)) => renderer.set_background(color),
            _ => {}
        }
    }

    fn set_wireframe(&mut self, _enabled: bool) {}

    fn set_quality(&mut self, level: f32) {
        let mut state = self.shared.state.borrow_mut();
        let size = quality_point_size(level);
        state.point_size = size;
        if let Backend::Fallback(Some(renderer)) = &mut state.backend {
            renderer.set_point_size(size);
        }
    }

    fn tick(&mut self, now: Instant) {
        let mut state = self.shared.state.borrow_mut();
        if let Backend::Fallback(Some(renderer)) = &mut state.backend {
            if let Err(err) = renderer.frame(now) {
                viewer_warn!(LOG_SOURCE, "'{}': frame failed: {}", self.shared.id, err);
            }
        }
    }

    fn update_metrics(&mut self) {
        if let Backend::Fallback(Some(renderer)) = &mut self.shared.state.borrow_mut().backend {
            renderer.update_metrics();
        }
    }

    fn metrics(&self) -> String {
        match &self.shared.state.borrow().backend {
            Backend::Fallback(Some(renderer)) => renderer.metrics().to_string(),
            _ => METRICS_PLACEHOLDER.to_string(),
        }
    }

    fn status(&self) -> String {
        self.shared.state.borrow().status.clone()
    }
}

impl Drop for DelegateViewport {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
#[path = "delegate_viewport_tests.rs"]
mod tests;
