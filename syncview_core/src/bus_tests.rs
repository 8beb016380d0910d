//! Unit tests for bus.rs
//!
//! Tests fan-out, late-joiner replay, subscription changes during a
//! broadcast, and failure containment.

use std::cell::RefCell;
use std::rc::Rc;
use glam::Vec3;
use crate::error::Error;
use super::*;

// ============================================================================
// TEST HELPERS
// ============================================================================

type Received = Rc<RefCell<Vec<(CameraPose, String)>>>;

fn new_bus() -> (Rc<Scheduler>, Rc<CameraBus>) {
    let scheduler = Rc::new(Scheduler::new());
    let bus = CameraBus::new(scheduler.clone());
    (scheduler, bus)
}

fn recorder() -> (Received, PoseListener) {
    let received: Received = Rc::new(RefCell::new(Vec::new()));
    let sink = received.clone();
    let listener: PoseListener = Box::new(move |pose, source| {
        sink.borrow_mut().push((*pose, source.to_string()));
        Ok(())
    });
    (received, listener)
}

fn pose_at(x: f32) -> CameraPose {
    CameraPose::new(Vec3::new(x, 2.0, 2.0), Vec3::ZERO, Vec3::Y, 60.0)
}

// ============================================================================
// FAN-OUT
// ============================================================================

#[test]
fn test_emit_reaches_every_subscriber() {
    let (_scheduler, bus) = new_bus();
    let (a, listener_a) = recorder();
    let (b, listener_b) = recorder();
    bus.subscribe(listener_a);
    bus.subscribe(listener_b);

    bus.emit(pose_at(1.0), "mesh");

    assert_eq!(*a.borrow(), vec![(pose_at(1.0), "mesh".to_string())]);
    assert_eq!(*b.borrow(), vec![(pose_at(1.0), "mesh".to_string())]);
    assert_eq!(bus.latest(), Some(pose_at(1.0)));
    assert_eq!(bus.emitted_count(), 1);
}

#[test]
fn test_emit_is_synchronous_and_ordered() {
    let (_scheduler, bus) = new_bus();
    let order = Rc::new(RefCell::new(Vec::new()));
    for name in ["first", "second", "third"] {
        let order = order.clone();
        bus.subscribe(Box::new(move |_, _| {
            order.borrow_mut().push(name);
            Ok(())
        }));
    }

    bus.emit(pose_at(1.0), "mesh");
    bus.emit(pose_at(2.0), "mesh");

    assert_eq!(*order.borrow(), vec!["first", "second", "third", "first", "second", "third"]);
}

#[test]
fn test_emit_never_deduplicates() {
    let (_scheduler, bus) = new_bus();
    let (received, listener) = recorder();
    bus.subscribe(listener);

    bus.emit(pose_at(1.0), "mesh");
    bus.emit(pose_at(1.0), "mesh");

    assert_eq!(received.borrow().len(), 2);
}

#[test]
fn test_unsubscribed_listener_receives_nothing() {
    let (_scheduler, bus) = new_bus();
    let (received, listener) = recorder();
    let key = bus.subscribe(listener);

    assert!(bus.unsubscribe(key));
    assert!(!bus.unsubscribe(key));
    bus.emit(pose_at(1.0), "mesh");

    assert!(received.borrow().is_empty());
    assert_eq!(bus.subscriber_count(), 0);
}

// ============================================================================
// LATE-JOINER REPLAY
// ============================================================================

#[test]
fn test_no_replay_before_first_emit() {
    let (scheduler, bus) = new_bus();
    let (received, listener) = recorder();
    bus.subscribe(listener);

    assert_eq!(scheduler.pending_count(), 0);
    scheduler.run_pending();
    assert!(received.borrow().is_empty());
}

#[test]
fn test_late_joiner_gets_one_deferred_replay() {
    let (scheduler, bus) = new_bus();
    bus.set_driver_id(Some("mesh"));
    bus.emit(pose_at(1.0), "mesh");

    let (received, listener) = recorder();
    bus.subscribe(listener);

    // Not delivered inside subscribe
    assert!(received.borrow().is_empty());

    scheduler.run_pending();
    scheduler.run_pending();

    assert_eq!(*received.borrow(), vec![(pose_at(1.0), "mesh".to_string())]);
}

#[test]
fn test_replay_without_driver_uses_empty_source() {
    let (scheduler, bus) = new_bus();
    bus.emit(pose_at(1.0), SCENE_SOURCE);

    let (received, listener) = recorder();
    bus.subscribe(listener);
    scheduler.run_pending();

    assert_eq!(received.borrow()[0].1, "");
}

#[test]
fn test_replay_delivers_latest_pose_at_run_time() {
    let (scheduler, bus) = new_bus();
    bus.set_driver_id(Some("mesh"));
    bus.emit(pose_at(1.0), "mesh");

    let (received, listener) = recorder();
    bus.subscribe(listener);
    bus.emit(pose_at(5.0), "mesh");
    scheduler.run_pending();

    let received = received.borrow();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].0, pose_at(5.0));
    assert_eq!(received[1].0, pose_at(5.0));
}

#[test]
fn test_unsubscribe_cancels_pending_replay() {
    let (scheduler, bus) = new_bus();
    bus.emit(pose_at(1.0), "mesh");

    let (received, listener) = recorder();
    let key = bus.subscribe(listener);
    assert_eq!(scheduler.pending_count(), 1);

    bus.unsubscribe(key);
    assert_eq!(scheduler.pending_count(), 0);

    scheduler.run_pending();
    assert!(received.borrow().is_empty());
}

// ============================================================================
// SUBSCRIPTION CHANGES DURING BROADCAST
// ============================================================================

#[test]
fn test_subscriber_added_mid_broadcast_misses_in_flight_event() {
    let (scheduler, bus) = new_bus();
    let (late, late_listener) = recorder();
    let late_listener = Rc::new(RefCell::new(Some(late_listener)));

    {
        let bus_inner = bus.clone();
        let late_listener = late_listener.clone();
        bus.subscribe(Box::new(move |_, _| {
            if let Some(listener) = late_listener.borrow_mut().take() {
                bus_inner.subscribe(listener);
            }
            Ok(())
        }));
    }

    bus.emit(pose_at(1.0), "mesh");
    assert!(late.borrow().is_empty());

    // ...but it still gets the deferred replay
    scheduler.run_pending();
    assert_eq!(late.borrow().len(), 1);
}

#[test]
fn test_subscriber_removed_mid_broadcast_is_skipped() {
    let (_scheduler, bus) = new_bus();
    let victim_key = Rc::new(RefCell::new(None));

    {
        let bus_inner = bus.clone();
        let victim_key = victim_key.clone();
        bus.subscribe(Box::new(move |_, _| {
            if let Some(key) = victim_key.borrow_mut().take() {
                bus_inner.unsubscribe(key);
            }
            Ok(())
        }));
    }
    let (victim, victim_listener) = recorder();
    *victim_key.borrow_mut() = Some(bus.subscribe(victim_listener));

    bus.emit(pose_at(1.0), "mesh");

    assert!(victim.borrow().is_empty());
    assert_eq!(bus.subscriber_count(), 1);
}

// ============================================================================
// FAILURE CONTAINMENT
// ============================================================================

#[test]
fn test_listener_error_does_not_stop_delivery() {
    let (_scheduler, bus) = new_bus();
    bus.subscribe(Box::new(|_, _| Err(Error::BackendError("lost surface".to_string()))));
    let (received, listener) = recorder();
    bus.subscribe(listener);

    bus.emit(pose_at(1.0), "mesh");

    assert_eq!(received.borrow().len(), 1);
}

#[test]
fn test_listener_panic_does_not_stop_delivery() {
    let (_scheduler, bus) = new_bus();
    bus.subscribe(Box::new(|_, _| panic!("listener bug")));
    let (received, listener) = recorder();
    bus.subscribe(listener);

    bus.emit(pose_at(1.0), "mesh");
    bus.emit(pose_at(2.0), "mesh");

    assert_eq!(received.borrow().len(), 2);
}

#[test]
fn test_reentrant_emit_skips_busy_listener() {
    let (_scheduler, bus) = new_bus();
    let calls = Rc::new(RefCell::new(0));
    {
        let bus_inner = bus.clone();
        let calls = calls.clone();
        bus.subscribe(Box::new(move |pose, _| {
            *calls.borrow_mut() += 1;
            if pose.position.x < 2.0 {
                bus_inner.emit(pose_at(9.0), "echo");
            }
            Ok(())
        }));
    }

    bus.emit(pose_at(1.0), "mesh");

    assert_eq!(*calls.borrow(), 1);
    assert_eq!(bus.latest(), Some(pose_at(9.0)));
}

// ============================================================================
// DRIVER ID
// ============================================================================

#[test]
fn test_driver_id_is_not_broadcast() {
    let (scheduler, bus) = new_bus();
    let (received, listener) = recorder();
    bus.subscribe(listener);

    bus.set_driver_id(Some("cloud"));
    scheduler.run_pending();

    assert_eq!(bus.driver_id().as_deref(), Some("cloud"));
    assert!(received.borrow().is_empty());

    bus.set_driver_id(None);
    assert_eq!(bus.driver_id(), None);
}
