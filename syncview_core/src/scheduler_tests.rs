use std::cell::RefCell;
use std::rc::Rc;
use super::*;

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn test_tasks_do_not_run_until_drained() {
    let scheduler = Scheduler::new();
    let ran = Rc::new(RefCell::new(false));

    let flag = ran.clone();
    scheduler.defer(move || *flag.borrow_mut() = true);

    assert!(!*ran.borrow());
    assert_eq!(scheduler.pending_count(), 1);

    assert_eq!(scheduler.run_pending(), 1);
    assert!(*ran.borrow());
    assert_eq!(scheduler.pending_count(), 0);
}

#[test]
fn test_tasks_run_fifo() {
    let scheduler = Scheduler::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    for i in 0..4 {
        let order = order.clone();
        scheduler.defer(move || order.borrow_mut().push(i));
    }
    scheduler.run_pending();

    assert_eq!(*order.borrow(), vec![0, 1, 2, 3]);
}

#[test]
fn test_task_deferred_during_drain_runs_after_existing_tasks() {
    let scheduler = Rc::new(Scheduler::new());
    let order = Rc::new(RefCell::new(Vec::new()));

    {
        let scheduler_inner = scheduler.clone();
        let order = order.clone();
        scheduler.defer(move || {
            order.borrow_mut().push("first");
            let order_nested = order.clone();
            scheduler_inner.defer(move || order_nested.borrow_mut().push("nested"));
        });
    }
    {
        let order = order.clone();
        scheduler.defer(move || order.borrow_mut().push("second"));
    }

    assert_eq!(scheduler.run_pending(), 3);
    assert_eq!(*order.borrow(), vec!["first", "second", "nested"]);
}

// ============================================================================
// Cancellation
// ============================================================================

#[test]
fn test_cancel_prevents_execution() {
    let scheduler = Scheduler::new();
    let ran = Rc::new(RefCell::new(false));

    let flag = ran.clone();
    let key = scheduler.defer(move || *flag.borrow_mut() = true);

    assert!(scheduler.is_pending(key));
    assert!(scheduler.cancel(key));
    assert!(!scheduler.is_pending(key));
    assert_eq!(scheduler.run_pending(), 0);
    assert!(!*ran.borrow());
}

#[test]
fn test_cancel_after_run_returns_false() {
    let scheduler = Scheduler::new();
    let key = scheduler.defer(|| {});
    scheduler.run_pending();
    assert!(!scheduler.cancel(key));
}

#[test]
fn test_task_can_cancel_later_task() {
    let scheduler = Rc::new(Scheduler::new());
    let ran = Rc::new(RefCell::new(false));

    let flag = ran.clone();
    let victim = Rc::new(RefCell::new(None));
    {
        let scheduler_inner = scheduler.clone();
        let victim = victim.clone();
        scheduler.defer(move || {
            if let Some(key) = victim.borrow_mut().take() {
                scheduler_inner.cancel(key);
            }
        });
    }
    *victim.borrow_mut() = Some(scheduler.defer(move || *flag.borrow_mut() = true));

    assert_eq!(scheduler.run_pending(), 1);
    assert!(!*ran.borrow());
}
