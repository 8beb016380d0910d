//! CameraBus: single-writer / many-reader pose channel.
//!
//! The bus carries the latest [`CameraPose`] and the id of the current
//! driver pane. It is constructed explicitly (normally by the controller)
//! and handed to every pane; there is no process-wide instance.
//!
//! Delivery rules:
//! - `emit` stores the pose and calls every subscriber present at call
//!   time, synchronously, in subscription order.
//! - A subscriber added during a broadcast does not receive that broadcast.
//!   A subscriber removed during a broadcast is skipped if not yet reached.
//! - A subscriber added after a pose exists gets exactly one deferred
//!   replay of the bus's latest pose, run on the [`Scheduler`]. Removing the
//!   subscriber before the replay runs cancels it.
//! - A listener's error or panic is contained at the listener boundary and
//!   never stops delivery to the other subscribers.

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use crate::error::Result;
use crate::pose::CameraPose;
use crate::scheduler::{Scheduler, TaskKey};
use crate::{viewer_error, viewer_trace, viewer_warn};

/// Source id used when a pose comes from a scene's initial camera
pub const SCENE_SOURCE: &str = "scene";

const LOG_SOURCE: &str = "syncview::CameraBus";

new_key_type! {
    /// Handle returned by [`CameraBus::subscribe`], used to unsubscribe
    pub struct SubscriptionKey;
}

/// Pose listener: `(pose, source_id)`.
///
/// An `Err` is logged by the bus and does not affect other listeners.
pub type PoseListener = Box<dyn FnMut(&CameraPose, &str) -> Result<()>>;

type SharedListener = Rc<RefCell<PoseListener>>;

struct BusState {
    latest: Option<CameraPose>,
    driver_id: Option<String>,
    listeners: SlotMap<SubscriptionKey, SharedListener>,
    pending_replays: FxHashMap<SubscriptionKey, TaskKey>,
    emitted: u64,
}

/// Camera pose bus shared by every pane of one viewer
pub struct CameraBus {
    scheduler: Rc<Scheduler>,
    self_ref: Weak<CameraBus>,
    state: RefCell<BusState>,
}

impl CameraBus {
    /// Create a bus whose late-joiner replays run on `scheduler`
    pub fn new(scheduler: Rc<Scheduler>) -> Rc<Self> {
        Rc::new_cyclic(|self_ref| Self {
            scheduler,
            self_ref: self_ref.clone(),
            state: RefCell::new(BusState {
                latest: None,
                driver_id: None,
                listeners: SlotMap::with_key(),
                pending_replays: FxHashMap::default(),
                emitted: 0,
            }),
        })
    }

    /// The scheduler replays are queued on
    pub fn scheduler(&self) -> &Rc<Scheduler> {
        &self.scheduler
    }

    // ===== SUBSCRIPTIONS =====

    /// Register a listener.
    ///
    /// If a pose has already been emitted, one replay of
    /// `(latest pose, driver id or "")` is queued on the scheduler.
    pub fn subscribe(&self, listener: PoseListener) -> SubscriptionKey {
        let mut state = self.state.borrow_mut();
        let key = state.listeners.insert(Rc::new(RefCell::new(listener)));

        if state.latest.is_some() {
            let bus = self.self_ref.clone();
            let task = self.scheduler.defer(move || {
                if let Some(bus) = bus.upgrade() {
                    bus.replay(key);
                }
            });
            state.pending_replays.insert(key, task);
        }

        viewer_trace!(LOG_SOURCE, "Subscribed {:?} ({} listeners)", key, state.listeners.len());
        key
    }

    /// Remove a listener and cancel its pending replay, if any.
    ///
    /// Returns false if the key was not subscribed.
    pub fn unsubscribe(&self, key: SubscriptionKey) -> bool {
        let mut state = self.state.borrow_mut();
        if let Some(task) = state.pending_replays.remove(&key) {
            self.scheduler.cancel(task);
        }
        state.listeners.remove(key).is_some()
    }

    pub fn is_subscribed(&self, key: SubscriptionKey) -> bool {
        self.state.borrow().listeners.contains_key(key)
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    // ===== DRIVER ROLE =====

    /// Id of the pane currently recorded as driver
    pub fn driver_id(&self) -> Option<String> {
        self.state.borrow().driver_id.clone()
    }

    /// Record the driver. Not broadcast: the controller follows a role
    /// change with an `emit` of the new driver's pose.
    pub fn set_driver_id(&self, id: Option<&str>) {
        self.state.borrow_mut().driver_id = id.map(str::to_string);
    }

    // ===== POSES =====

    /// Latest emitted pose
    pub fn latest(&self) -> Option<CameraPose> {
        self.state.borrow().latest
    }

    /// Number of `emit` calls so far
    pub fn emitted_count(&self) -> u64 {
        self.state.borrow().emitted
    }

    /// Store `pose` as latest and deliver it to every current subscriber
    pub fn emit(&self, pose: CameraPose, source_id: &str) {
        let snapshot: Vec<(SubscriptionKey, SharedListener)> = {
            let mut state = self.state.borrow_mut();
            state.latest = Some(pose);
            state.emitted += 1;
            state.listeners.iter().map(|(key, l)| (key, l.clone())).collect()
        };

        viewer_trace!(LOG_SOURCE, "Emit from '{}' to {} listeners", source_id, snapshot.len());

        for (key, listener) in snapshot {
            // Unsubscribed earlier in this broadcast
            if !self.is_subscribed(key) {
                continue;
            }
            Self::deliver(key, &listener, &pose, source_id);
        }
    }

    /// Run the deferred late-joiner replay for `key`
    fn replay(&self, key: SubscriptionKey) {
        let (listener, pose, source) = {
            let mut state = self.state.borrow_mut();
            state.pending_replays.remove(&key);
            let Some(listener) = state.listeners.get(key).cloned() else {
                return;
            };
            let Some(pose) = state.latest else {
                return;
            };
            (listener, pose, state.driver_id.clone().unwrap_or_default())
        };

        viewer_trace!(LOG_SOURCE, "Replaying latest pose to {:?}", key);
        Self::deliver(key, &listener, &pose, &source);
    }

    /// Call one listener, containing its failures
    fn deliver(key: SubscriptionKey, listener: &SharedListener, pose: &CameraPose, source_id: &str) {
        let Ok(mut callback) = listener.try_borrow_mut() else {
            viewer_warn!(LOG_SOURCE, "Listener {:?} re-entered while handling a pose; skipped", key);
            return;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| (*callback)(pose, source_id))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                viewer_warn!(LOG_SOURCE, "Listener {:?} failed on pose from '{}': {}", key, source_id, err);
            }
            Err(_) => {
                viewer_error!(LOG_SOURCE, "Listener {:?} panicked on pose from '{}'", key, source_id);
            }
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
