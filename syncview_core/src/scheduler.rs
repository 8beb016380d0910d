//! Scheduler: cooperative single-threaded queue of deferred tasks.
//!
//! Stands in for the host event loop's microtask queue. Tasks run in FIFO
//! order when [`Scheduler::run_pending`] is called, after the current
//! synchronous call stack has unwound. Tasks queued while draining run in
//! the same drain, after everything queued before them.

use std::cell::RefCell;
use std::collections::VecDeque;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Stable handle to a deferred task, used to cancel it before it runs
    pub struct TaskKey;
}

type Task = Box<dyn FnOnce()>;

struct SchedulerState {
    tasks: SlotMap<TaskKey, Task>,
    queue: VecDeque<TaskKey>,
}

/// Cooperative FIFO task queue.
///
/// The queue is never borrowed while a task runs, so tasks may freely
/// defer or cancel other tasks.
pub struct Scheduler {
    state: RefCell<SchedulerState>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(SchedulerState {
                tasks: SlotMap::with_key(),
                queue: VecDeque::new(),
            }),
        }
    }

    /// Queue a task to run on the next drain
    pub fn defer(&self, task: impl FnOnce() + 'static) -> TaskKey {
        let mut state = self.state.borrow_mut();
        let key = state.tasks.insert(Box::new(task));
        state.queue.push_back(key);
        key
    }

    /// Cancel a task that has not run yet.
    ///
    /// Returns false if the task already ran or was cancelled.
    pub fn cancel(&self, key: TaskKey) -> bool {
        self.state.borrow_mut().tasks.remove(key).is_some()
    }

    /// Whether the task is still waiting to run
    pub fn is_pending(&self, key: TaskKey) -> bool {
        self.state.borrow().tasks.contains_key(key)
    }

    /// Number of tasks waiting to run
    pub fn pending_count(&self) -> usize {
        self.state.borrow().tasks.len()
    }

    /// Run queued tasks until the queue is empty.
    ///
    /// Returns the number of tasks executed.
    pub fn run_pending(&self) -> usize {
        let mut executed = 0;
        loop {
            let task = {
                let mut state = self.state.borrow_mut();
                let Some(key) = state.queue.pop_front() else {
                    break;
                };
                // Cancelled tasks leave a stale key in the queue
                match state.tasks.remove(key) {
                    Some(task) => task,
                    None => continue,
                }
            };
            task();
            executed += 1;
        }
        executed
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
