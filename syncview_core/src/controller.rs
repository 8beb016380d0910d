/// ViewerController: owns the panes and arbitrates the driver role.
///
/// The controller constructs the camera bus and the scheduler it runs on,
/// keeps the panes in insertion order, and fans out scene loads and global
/// appearance commands. Exactly one pane is driver once `start` succeeds.

use std::rc::Rc;
use std::time::Instant;
use rustc_hash::FxHashMap;
use crate::bus::{CameraBus, SCENE_SOURCE};
use crate::camera::CameraInput;
use crate::config::{Color, ViewerConfig};
use crate::error::{Error, Result};
use crate::scene_config::SceneConfig;
use crate::scheduler::Scheduler;
use crate::viewport::{DriverRequestSignal, Viewport};
use crate::{viewer_debug, viewer_error, viewer_info, viewer_warn};

const LOG_SOURCE: &str = "syncview::ViewerController";

/// Top-level coordinator of one multi-pane viewer
pub struct ViewerController {
    config: ViewerConfig,
    scheduler: Rc<Scheduler>,
    bus: Rc<CameraBus>,
    viewports: Vec<Box<dyn Viewport>>,
    index: FxHashMap<String, usize>,
    driver_signal: DriverRequestSignal,
    scene: Option<Rc<SceneConfig>>,
    started: bool,
}

impl ViewerController {
    /// Create a controller with its own scheduler and camera bus
    pub fn new(config: ViewerConfig) -> Self {
        let scheduler = Rc::new(Scheduler::new());
        let bus = CameraBus::new(scheduler.clone());
        Self {
            config,
            scheduler,
            bus,
            viewports: Vec::new(),
            index: FxHashMap::default(),
            driver_signal: DriverRequestSignal::new(),
            scene: None,
            started: false,
        }
    }

    /// Bus to hand to panes at construction
    pub fn bus(&self) -> &Rc<CameraBus> {
        &self.bus
    }

    pub fn scheduler(&self) -> &Rc<Scheduler> {
        &self.scheduler
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    // ===== PANES =====

    /// Register a pane.
    ///
    /// The pane is connected to the driver-request signal, and mounted
    /// right away if the viewer has already started.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateViewport` if a pane with the same id exists.
    pub fn add_viewport(&mut self, mut viewport: Box<dyn Viewport>) -> Result<()> {
        let id = viewport.id().to_string();
        if self.index.contains_key(&id) {
            return Err(Error::DuplicateViewport(id));
        }

        viewport.connect_driver_signal(self.driver_signal.clone());
        if self.started {
            Self::mount_one(viewport.as_mut());
            if let Some(scene) = &self.scene {
                viewport.attach_scene(scene.clone());
            }
        }

        viewer_debug!(LOG_SOURCE, "Added viewport '{}' ({:?})", id, viewport.kind());
        self.index.insert(id, self.viewports.len());
        self.viewports.push(viewport);
        Ok(())
    }

    pub fn viewport(&self, id: &str) -> Option<&dyn Viewport> {
        self.index.get(id).map(|&i| self.viewports[i].as_ref() as &dyn Viewport)
    }

    pub fn viewport_mut(&mut self, id: &str) -> Option<&mut (dyn Viewport + 'static)> {
        let index = *self.index.get(id)?;
        Some(self.viewports[index].as_mut())
    }

    /// Panes in insertion order
    pub fn viewports(&self) -> impl Iterator<Item = &dyn Viewport> {
        self.viewports.iter().map(|v| v.as_ref() as &dyn Viewport)
    }

    pub fn viewport_count(&self) -> usize {
        self.viewports.len()
    }

    // ===== LIFECYCLE =====

    /// Mount every pane and assign the initial driver.
    ///
    /// The driver is `config.initial_driver` when such a pane exists,
    /// otherwise the first pane. A pane that fails to mount is logged and
    /// the others keep operating.
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` if no pane was added.
    pub fn start(&mut self) -> Result<()> {
        if self.viewports.is_empty() {
            return Err(Error::InitializationFailed("no viewports to start".to_string()));
        }

        self.mount_all();
        self.started = true;

        let configured = self
            .config
            .initial_driver
            .clone()
            .filter(|id| self.index.contains_key(id));
        if configured.is_none() {
            if let Some(id) = &self.config.initial_driver {
                viewer_warn!(LOG_SOURCE, "Initial driver '{}' is not a viewport, using the first pane", id);
            }
        }
        let driver = match configured {
            Some(id) => id,
            None => self.viewports[0].id().to_string(),
        };

        viewer_info!(LOG_SOURCE, "Started {} viewports, driver '{}'", self.viewports.len(), driver);
        self.set_driver(&driver)
    }

    pub fn mount_all(&mut self) {
        for viewport in self.viewports.iter_mut() {
            Self::mount_one(viewport.as_mut());
        }
    }

    pub fn unmount_all(&mut self) {
        for viewport in self.viewports.iter_mut() {
            viewport.unmount();
        }
        self.started = false;
        viewer_info!(LOG_SOURCE, "Unmounted all viewports");
    }

    fn mount_one(viewport: &mut dyn Viewport) {
        if viewport.is_mounted() {
            return;
        }
        if let Err(err) = viewport.mount() {
            viewer_error!(LOG_SOURCE, "Viewport '{}' failed to mount: {}", viewport.id(), err);
        }
    }

    // ===== DRIVER ROLE =====

    /// Make `id` the only driver and publish its current pose.
    ///
    /// # Errors
    ///
    /// Returns `UnknownViewport` without changing any role if `id` is not
    /// registered.
    pub fn set_driver(&mut self, id: &str) -> Result<()> {
        let Some(&driver) = self.index.get(id) else {
            return Err(Error::UnknownViewport(id.to_string()));
        };

        self.bus.set_driver_id(Some(id));
        for (i, viewport) in self.viewports.iter_mut().enumerate() {
            viewport.set_driver(i == driver);
        }
        viewer_info!(LOG_SOURCE, "Driver is now '{}'", id);

        match self.viewports[driver].pose() {
            Some(pose) => self.bus.emit(pose, id),
            None => viewer_debug!(LOG_SOURCE, "Driver '{}' has no pose to publish yet", id),
        }
        Ok(())
    }

    pub fn driver_id(&self) -> Option<String> {
        self.bus.driver_id()
    }

    /// Apply every queued driver request, oldest first (last one wins)
    pub fn process_driver_requests(&mut self) {
        for id in self.driver_signal.drain() {
            if let Err(err) = self.set_driver(&id) {
                viewer_warn!(LOG_SOURCE, "Ignoring driver request: {}", err);
            }
        }
    }

    /// Route user camera input to one pane
    pub fn handle_input(&mut self, id: &str, input: CameraInput) -> Result<()> {
        let viewport = self
            .viewport_mut(id)
            .ok_or_else(|| Error::UnknownViewport(id.to_string()))?;
        viewport.handle_input(input);
        Ok(())
    }

    // ===== SCENE =====

    /// Attach `scene` to every pane, then reset every camera to the scene's
    /// initial camera if it declares one.
    pub fn load_scene(&mut self, scene: SceneConfig) {
        let scene = Rc::new(scene);
        viewer_info!(LOG_SOURCE, "Loading scene '{}'", scene.name);

        self.scene = Some(scene.clone());
        for viewport in self.viewports.iter_mut() {
            viewport.attach_scene(scene.clone());
        }

        if let Some(initial) = scene.initial_camera {
            self.bus.emit(initial, SCENE_SOURCE);
            let driver = self.driver_id().and_then(|id| self.index.get(&id).copied());
            if let Some(driver) = driver {
                self.viewports[driver].apply_pose(&initial);
            }
        }
    }

    pub fn attached_scene(&self) -> Option<Rc<SceneConfig>> {
        self.scene.clone()
    }

    // ===== APPEARANCE =====

    pub fn set_background(&mut self, color: Color) {
        self.config.background = color;
        for viewport in self.viewports.iter_mut() {
            viewport.set_background(color);
        }
    }

    pub fn set_wireframe(&mut self, enabled: bool) {
        for viewport in self.viewports.iter_mut() {
            viewport.set_wireframe(enabled);
        }
    }

    pub fn set_quality(&mut self, level: f32) {
        for viewport in self.viewports.iter_mut() {
            viewport.set_quality(level);
        }
    }

    // ===== FRAME LOOP =====

    /// One display refresh: driver requests, deferred work, then every
    /// pane renders and refreshes its metrics.
    pub fn tick(&mut self, now: Instant) {
        self.process_driver_requests();
        self.scheduler.run_pending();

        for viewport in self.viewports.iter_mut() {
            viewport.tick(now);
            viewport.update_metrics();
        }

        self.scheduler.run_pending();
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
