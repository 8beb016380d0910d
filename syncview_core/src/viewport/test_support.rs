//! Recording collaborators shared by viewport and controller unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use crate::backend::{BackendFactory, HeadlessBackend, RenderBackend};
use crate::bus::CameraBus;
use crate::collaborators::{
    DelegateCallback, DelegateProvider, DelegateRenderer, FrameImage, FrameRequest, FrameResponse,
    FrameTransport,
};
use crate::config::Color;
use crate::error::{Error, Result};
use crate::pose::CameraPose;
use crate::scheduler::Scheduler;

pub fn new_bus() -> (Rc<Scheduler>, Rc<CameraBus>) {
    let scheduler = Rc::new(Scheduler::new());
    let bus = CameraBus::new(scheduler.clone());
    (scheduler, bus)
}

// ============================================================================
// Backends
// ============================================================================

/// Every backend created by a factory, newest last
pub type CreatedBackends = Rc<RefCell<Vec<Rc<RefCell<HeadlessBackend>>>>>;

/// Factory handing out observable headless backends
pub fn observed_factory() -> (CreatedBackends, BackendFactory) {
    let created: CreatedBackends = Rc::new(RefCell::new(Vec::new()));
    let sink = created.clone();
    let factory: BackendFactory = Box::new(move || {
        let backend = Rc::new(RefCell::new(HeadlessBackend::new(960, 540)));
        sink.borrow_mut().push(backend.clone());
        Ok(Box::new(backend) as Box<dyn RenderBackend>)
    });
    (created, factory)
}

pub fn failing_factory() -> BackendFactory {
    Box::new(|| Err(Error::InitializationFailed("no surface".to_string())))
}

// ============================================================================
// Frame transport
// ============================================================================

#[derive(Default)]
pub struct TransportLog {
    pub requests: Vec<FrameRequest>,
    pub cancelled: Vec<u64>,
    pub responses: VecDeque<FrameResponse>,
    pub fail_send: bool,
}

/// Transport recording requests; responses are queued by the test
#[derive(Clone, Default)]
pub struct RecordingTransport {
    pub log: Rc<RefCell<TransportLog>>,
}

impl RecordingTransport {
    pub fn respond_ok(&self, sequence: u64) {
        self.log.borrow_mut().responses.push_back(FrameResponse {
            sequence,
            result: Ok(FrameImage { bytes: vec![0xff, 0xd8], content_type: "image/jpeg".to_string() }),
        });
    }

    pub fn respond_err(&self, sequence: u64) {
        self.log.borrow_mut().responses.push_back(FrameResponse {
            sequence,
            result: Err(Error::RemoteRequestFailed("HTTP 500".to_string())),
        });
    }

    pub fn request_count(&self) -> usize {
        self.log.borrow().requests.len()
    }

    pub fn last_request(&self) -> Option<FrameRequest> {
        self.log.borrow().requests.last().cloned()
    }
}

impl FrameTransport for RecordingTransport {
    fn request_frame(&mut self, request: FrameRequest) -> Result<()> {
        let mut log = self.log.borrow_mut();
        if log.fail_send {
            return Err(Error::RemoteRequestFailed("connection refused".to_string()));
        }
        log.requests.push(request);
        Ok(())
    }

    fn poll_response(&mut self) -> Option<FrameResponse> {
        self.log.borrow_mut().responses.pop_front()
    }

    fn cancel(&mut self, sequence: u64) {
        self.log.borrow_mut().cancelled.push(sequence);
    }
}

// ============================================================================
// Delegate renderer
// ============================================================================

#[derive(Default)]
pub struct DelegateLog {
    pub camera: Option<CameraPose>,
    pub cameras_set: usize,
    pub scenes: Vec<String>,
    pub background: Option<Color>,
    pub renders_requested: usize,
    pub disposed: bool,
    pub reject_scenes: bool,
}

/// Delegate renderer recording every call
#[derive(Clone, Default)]
pub struct RecordingDelegate {
    pub log: Rc<RefCell<DelegateLog>>,
}

impl DelegateRenderer for RecordingDelegate {
    fn set_camera(&mut self, pose: &CameraPose) {
        let mut log = self.log.borrow_mut();
        log.camera = Some(*pose);
        log.cameras_set += 1;
    }

    fn camera(&self) -> Option<CameraPose> {
        self.log.borrow().camera
    }

    fn add_splat_scene(&mut self, asset_ref: &str) -> Result<()> {
        let mut log = self.log.borrow_mut();
        if log.reject_scenes {
            return Err(Error::AssetUnavailable(asset_ref.to_string()));
        }
        log.scenes.push(asset_ref.to_string());
        Ok(())
    }

    fn set_background(&mut self, color: Color) {
        self.log.borrow_mut().background = Some(color);
    }

    fn request_render(&mut self) {
        self.log.borrow_mut().renders_requested += 1;
    }

    fn dispose(&mut self) {
        self.log.borrow_mut().disposed = true;
    }
}

/// Provider whose acquisition completes when the test says so
#[derive(Clone, Default)]
pub struct ManualProvider {
    pending: Rc<RefCell<Option<DelegateCallback>>>,
}

impl ManualProvider {
    pub fn is_waiting(&self) -> bool {
        self.pending.borrow().is_some()
    }

    pub fn succeed(&self, delegate: RecordingDelegate) {
        let done = self.pending.borrow_mut().take();
        if let Some(done) = done {
            done(Ok(Box::new(delegate)));
        }
    }

    pub fn fail(&self) {
        let done = self.pending.borrow_mut().take();
        if let Some(done) = done {
            done(Err(Error::DelegateUnavailable("module not installed".to_string())));
        }
    }
}

impl DelegateProvider for ManualProvider {
    fn acquire(&self, done: DelegateCallback) {
        *self.pending.borrow_mut() = Some(done);
    }
}

/// Provider that hands out a delegate immediately
pub struct ReadyProvider(pub RecordingDelegate);

impl DelegateProvider for ReadyProvider {
    fn acquire(&self, done: DelegateCallback) {
        done(Ok(Box::new(self.0.clone())));
    }
}
