//! Common test utilities for integration tests.

#![allow(dead_code)]

pub mod harness;

use holon_flow_editor::{ChangeKind, Edge, GraphStore, Node, Position, ResetScheduler};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Tracks change notifications for testing.
#[derive(Default, Clone)]
pub struct CallbackTracker {
    /// Every notification in firing order
    pub changes: Rc<RefCell<Vec<ChangeKind>>>,
}

impl CallbackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, kind: ChangeKind) {
        self.changes.borrow_mut().push(kind);
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.changes.borrow().iter().filter(|&&k| k == kind).count()
    }

    pub fn saw(&self, kind: ChangeKind) -> bool {
        self.count(kind) > 0
    }

    pub fn is_empty(&self) -> bool {
        self.changes.borrow().is_empty()
    }

    /// Clear all recorded notifications.
    pub fn clear(&self) {
        self.changes.borrow_mut().clear();
    }
}

/// Scheduler that holds the pending reset until the test fires it.
#[derive(Default)]
pub struct ManualScheduler {
    pending: RefCell<Option<Box<dyn FnOnce()>>>,
    last_delay: Cell<Option<Duration>>,
    scheduled: Cell<usize>,
    cancelled: Cell<usize>,
}

impl ManualScheduler {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Run the pending task, if any. Returns whether one ran.
    pub fn fire(&self) -> bool {
        let task = self.pending.borrow_mut().take();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }

    pub fn last_delay(&self) -> Option<Duration> {
        self.last_delay.get()
    }

    pub fn scheduled(&self) -> usize {
        self.scheduled.get()
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled.get()
    }
}

impl ResetScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) {
        *self.pending.borrow_mut() = Some(task);
        self.last_delay.set(Some(delay));
        self.scheduled.set(self.scheduled.get() + 1);
    }

    fn cancel(&self) {
        if self.pending.borrow_mut().take().is_some() {
            self.cancelled.set(self.cancelled.get() + 1);
        }
    }
}

/// Nodes {1:"A", 2:"B", 3:"C"} with edges 1-2, 1-3.
///
/// A sits on its own level; B and C share a level.
pub fn three_holon_graph() -> GraphStore {
    GraphStore::from_parts(
        vec![
            Node::new("1", "A", Position::new(250.0, 5.0)),
            Node::new("2", "B", Position::new(100.0, 120.0)),
            Node::new("3", "C", Position::new(400.0, 120.0)),
        ],
        vec![Edge::new("e1-2", "1", "2"), Edge::new("e1-3", "1", "3")],
    )
}

/// Two branches under one root plus a shortcut edge between the branches.
///
/// ```text
///       r
///      / \
///     a   b      level 100
///     |\  |
///     | \ |
///    a1  b1      level 200
/// ```
pub fn branching_graph() -> GraphStore {
    GraphStore::from_parts(
        vec![
            Node::new("r", "Root", Position::new(200.0, 0.0)),
            Node::new("a", "Left", Position::new(100.0, 100.0)),
            Node::new("b", "Right", Position::new(300.0, 100.0)),
            Node::new("a1", "Left leaf", Position::new(100.0, 200.0)),
            Node::new("b1", "Right leaf", Position::new(300.0, 200.0)),
        ],
        vec![
            Edge::new("r-a", "r", "a"),
            Edge::new("r-b", "r", "b"),
            Edge::new("a-a1", "a", "a1"),
            Edge::new("b-b1", "b", "b1"),
            Edge::new("a-b1", "a", "b1"),
        ],
    )
}
