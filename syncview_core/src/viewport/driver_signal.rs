/// Driver-request signal shared between panes and the controller

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Queue of "make me driver" requests.
///
/// Cloned into every pane; the controller drains it in request order.
#[derive(Debug, Clone, Default)]
pub struct DriverRequestSignal {
    queue: Rc<RefCell<VecDeque<String>>>,
}

impl DriverRequestSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self, viewport_id: &str) {
        self.queue.borrow_mut().push_back(viewport_id.to_string());
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Take every queued request, oldest first
    pub fn drain(&self) -> Vec<String> {
        self.queue.borrow_mut().drain(..).collect()
    }
}
