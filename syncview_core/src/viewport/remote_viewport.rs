/// RemoteViewport: pull-based pane showing frames rendered by a server.
///
/// Holds no camera. Every foreign pose received while follower is recorded
/// and, unless a request is already in flight, sent to the render server.
/// Responses are collected on `tick`.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;
use crate::bus::{CameraBus, PoseListener, SubscriptionKey};
use crate::camera::CameraInput;
use crate::collaborators::{FrameImage, FrameRequest, FrameResponse, FrameTransport};
use crate::config::{Color, RemoteConfig};
use crate::error::{Error, Result};
use crate::pose::CameraPose;
use crate::scene_config::SceneConfig;
use crate::{viewer_debug, viewer_info, viewer_trace, viewer_warn};
use super::local_renderer::METRICS_PLACEHOLDER;
use super::{DriverRequestSignal, Viewport, ViewportCapabilities, ViewportKind};

const LOG_SOURCE: &str = "syncview::RemoteViewport";

/// Status lines shown by a remote pane
pub mod status {
    pub const NOT_CONNECTED: &str = "NeRF server not connected.";
    pub const NOT_CONFIGURED: &str = "NeRF server not configured.";
    pub const WAITING_FOR_POSE: &str = "Waiting for camera pose…";
    pub const FETCH_FAILED: &str = "Failed to fetch NeRF frame.";
    pub const TIMED_OUT: &str = "NeRF frame request timed out.";
}

/// Smallest fraction of the configured frame size requested at quality 0
const MIN_RESOLUTION_SCALE: f32 = 0.25;

#[derive(Debug, Clone, Copy)]
struct InFlight {
    sequence: u64,
    /// Tick time the request was sent at; stamped by the next tick if none was seen yet
    started: Option<Instant>,
}

struct RemoteState {
    transport: Box<dyn FrameTransport>,
    config: RemoteConfig,
    mounted: bool,
    is_driver: bool,
    scene: Option<Rc<SceneConfig>>,
    endpoint: Option<String>,
    subscription: Option<SubscriptionKey>,
    last_pose: Option<CameraPose>,
    in_flight: Option<InFlight>,
    /// `now` of the most recent tick
    clock: Option<Instant>,
    /// A pose arrived while in flight (only tracked when coalescing)
    pending: bool,
    sequence: u64,
    quality: f32,
    frame: Option<FrameImage>,
    frames_received: u64,
    applied: u64,
    status: String,
}

impl RemoteState {
    /// Frame size for the current quality level
    fn frame_size(&self) -> (u32, u32) {
        let scale = MIN_RESOLUTION_SCALE + (1.0 - MIN_RESOLUTION_SCALE) * self.quality;
        let scaled = |size: u32| ((size as f32 * scale).round() as u32).max(1);
        (scaled(self.config.frame_width), scaled(self.config.frame_height))
    }

    fn record_pose(&mut self, pose: &CameraPose, viewport_id: &str) {
        self.applied += 1;
        self.last_pose = Some(*pose);
        self.request_frame(viewport_id);
    }

    /// Send the last recorded pose, unless a request is already in flight
    fn request_frame(&mut self, viewport_id: &str) {
        if !self.mounted {
            return;
        }
        let (Some(endpoint), Some(pose)) = (self.endpoint.clone(), self.last_pose) else {
            return;
        };
        if self.in_flight.is_some() {
            if self.config.coalesce_pending {
                self.pending = true;
            }
            viewer_trace!(LOG_SOURCE, "'{}': request in flight, pose not sent", viewport_id);
            return;
        }

        self.sequence += 1;
        let (width, height) = self.frame_size();
        let request = FrameRequest { endpoint, pose, width, height, sequence: self.sequence };
        viewer_trace!(LOG_SOURCE, "'{}': requesting {}", viewport_id, request.url());

        match self.transport.request_frame(request) {
            Ok(()) => {
                self.in_flight = Some(InFlight { sequence: self.sequence, started: self.clock });
            }
            Err(err) => {
                viewer_warn!(LOG_SOURCE, "'{}': {}", viewport_id, err);
                self.status = status::FETCH_FAILED.to_string();
            }
        }
    }

    fn handle_response(&mut self, response: FrameResponse, viewport_id: &str) {
        let current = self.in_flight.map(|f| f.sequence);
        if current != Some(response.sequence) {
            viewer_trace!(LOG_SOURCE, "'{}': ignoring late response #{}", viewport_id, response.sequence);
            return;
        }
        self.in_flight = None;

        match response.result {
            Ok(frame) => {
                self.frame = Some(frame);
                self.frames_received += 1;
                self.status.clear();
            }
            Err(err) => {
                viewer_warn!(LOG_SOURCE, "'{}': {}", viewport_id, err);
                self.status = status::FETCH_FAILED.to_string();
            }
        }
    }

    fn check_timeout(&mut self, now: Instant, viewport_id: &str) {
        self.clock = Some(now);
        let (Some(in_flight), Some(timeout)) = (self.in_flight.as_mut(), self.config.request_timeout()) else {
            return;
        };
        let Some(started) = in_flight.started else {
            in_flight.started = Some(now);
            return;
        };
        if now.saturating_duration_since(started) < timeout {
            return;
        }
        let in_flight = *in_flight;
        viewer_warn!(LOG_SOURCE, "'{}': request #{} timed out after {:?}",
            viewport_id, in_flight.sequence, timeout);
        self.transport.cancel(in_flight.sequence);
        self.in_flight = None;
        self.status = status::TIMED_OUT.to_string();
    }
}

/// Pane displaying server-rendered frames
pub struct RemoteViewport {
    id: String,
    title: String,
    bus: Rc<CameraBus>,
    driver_signal: Option<DriverRequestSignal>,
    state: Rc<RefCell<RemoteState>>,
}

impl RemoteViewport {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        bus: Rc<CameraBus>,
        transport: Box<dyn FrameTransport>,
        config: RemoteConfig,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            bus,
            driver_signal: None,
            state: Rc::new(RefCell::new(RemoteState {
                transport,
                config,
                mounted: false,
                is_driver: false,
                scene: None,
                endpoint: None,
                subscription: None,
                last_pose: None,
                in_flight: None,
                clock: None,
                pending: false,
                sequence: 0,
                quality: 1.0,
                frame: None,
                frames_received: 0,
                applied: 0,
                status: String::new(),
            })),
        }
    }

    /// Latest frame received
    pub fn frame(&self) -> Option<FrameImage> {
        self.state.borrow().frame.clone()
    }

    pub fn frames_received(&self) -> u64 {
        self.state.borrow().frames_received
    }

    /// Whether a frame request is outstanding
    pub fn is_request_in_flight(&self) -> bool {
        self.state.borrow().in_flight.is_some()
    }

    /// Last pose recorded from the bus
    pub fn last_pose(&self) -> Option<CameraPose> {
        self.state.borrow().last_pose
    }

    /// Frame size requested at the current quality
    pub fn frame_size(&self) -> (u32, u32) {
        self.state.borrow().frame_size()
    }

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
            state.record_pose(pose, &own_id);
            Ok(())
        })
    }
}

impl Viewport for RemoteViewport {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn kind(&self) -> ViewportKind {
        ViewportKind::Remote
    }

    fn capabilities(&self) -> ViewportCapabilities {
        ViewportCapabilities::QUALITY
    }

    fn mount(&mut self) -> Result<()> {
        {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            if state.mounted {
                viewer_warn!(LOG_SOURCE, "'{}' is already mounted", self.id);
                return Ok(());
            }
            state.mounted = true;
            state.status = match &state.scene {
                None => status::NOT_CONNECTED.to_string(),
                Some(_) if state.endpoint.is_none() => status::NOT_CONFIGURED.to_string(),
                Some(_) => status::WAITING_FOR_POSE.to_string(),
            };
        }

        let key = self.bus.subscribe(self.listener());
        self.state.borrow_mut().subscription = Some(key);
        viewer_info!(LOG_SOURCE, "Mounted '{}'", self.id);
        Ok(())
    }

    fn unmount(&mut self) {
        let subscription = {
            let mut state = self.state.borrow_mut();
            if !state.mounted {
                return;
            }
            if let Some(in_flight) = state.in_flight.take() {
                state.transport.cancel(in_flight.sequence);
            }
            state.mounted = false;
            state.pending = false;
            state.subscription.take()
        };
        if let Some(key) = subscription {
            self.bus.unsubscribe(key);
        }
        viewer_info!(LOG_SOURCE, "Unmounted '{}'", self.id);
    }

    fn is_mounted(&self) -> bool {
        self.state.borrow().mounted
    }

    fn attach_scene(&mut self, scene: Rc<SceneConfig>) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.endpoint = scene.remote_endpoint().map(str::to_string);
        state.status = match &state.endpoint {
            Some(endpoint) => {
                viewer_debug!(LOG_SOURCE, "'{}': render server {}", self.id, endpoint);
                status::WAITING_FOR_POSE.to_string()
            }
            None => status::NOT_CONFIGURED.to_string(),
        };
        state.scene = Some(scene);
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

    /// Always `None`: the pane only displays
    fn pose(&self) -> Option<CameraPose> {
        None
    }

    fn apply_pose(&mut self, pose: &CameraPose) {
        self.state.borrow_mut().record_pose(pose, &self.id);
    }

    fn applied_pose_count(&self) -> u64 {
        self.state.borrow().applied
    }

    fn handle_input(&mut self, _input: CameraInput) {}

    fn set_background(&mut self, _color: Color) {}

    fn set_wireframe(&mut self, _enabled: bool) {}

    fn set_quality(&mut self, level: f32) {
        self.state.borrow_mut().quality = level.clamp(0.0, 1.0);
    }

    fn tick(&mut self, now: Instant) {
        let mut state = self.state.borrow_mut();
        while let Some(response) = state.transport.poll_response() {
            state.handle_response(response, &self.id);
        }
        state.check_timeout(now, &self.id);

        if state.pending && state.in_flight.is_none() {
            state.pending = false;
            state.request_frame(&self.id);
        }
    }

    fn update_metrics(&mut self) {}

    fn metrics(&self) -> String {
        METRICS_PLACEHOLDER.to_string()
    }

    fn status(&self) -> String {
        self.state.borrow().status.clone()
    }
}

impl Drop for RemoteViewport {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
#[path = "remote_viewport_tests.rs"]
mod tests;
