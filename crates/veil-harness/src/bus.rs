#![forbid(unsafe_code)]

//! In-memory event bus with dispatch simulation.
//!
//! # Invariants
//!
//! 1. Listeners on a target run in registration order.
//! 2. A listener removed during dispatch is not invoked afterwards, even if
//!    it was part of the dispatch snapshot.
//! 3. A one-shot listener is removed before it runs, so it runs at most once
//!    even if its handler re-dispatches.
//! 4. Listeners added during dispatch do not see the in-flight event.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;
use veil_core::{DomEvent, EventBus, EventKind, EventTarget, Handler, ListenerId};

struct Listener {
    target: EventTarget,
    kind: EventKind,
    once: bool,
    handler: Handler,
}

#[derive(Default)]
struct BusState {
    next_id: u64,
    listeners: AHashMap<ListenerId, Listener>,
}

/// In-memory [`EventBus`].
#[derive(Default)]
pub struct FakeEventBus {
    state: RefCell<BusState>,
}

impl FakeEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every listener on `target` for `event.kind`.
    ///
    /// Returns the number of handlers invoked.
    pub fn dispatch(&self, target: EventTarget, event: &mut DomEvent) -> usize {
        let mut snapshot: Vec<(ListenerId, bool, Handler)> = self
            .state
            .borrow()
            .listeners
            .iter()
            .filter(|(_, l)| l.target == target && l.kind == event.kind)
            .map(|(id, l)| (*id, l.once, Rc::clone(&l.handler)))
            .collect();
        snapshot.sort_by_key(|(id, _, _)| *id);

        let mut invoked = 0;
        for (id, once, handler) in snapshot {
            if !self.is_registered(id) {
                continue;
            }
            if once {
                self.unlisten(id);
            }
            tracing::trace!(listener = id.raw(), kind = %event.kind, "dispatch");
            handler(event);
            invoked += 1;
        }
        invoked
    }

    /// Whether `id` is still installed.
    #[must_use]
    pub fn is_registered(&self, id: ListenerId) -> bool {
        self.state.borrow().listeners.contains_key(&id)
    }

    /// Number of listeners installed on `target` for `kind`.
    #[must_use]
    pub fn listener_count(&self, target: EventTarget, kind: &EventKind) -> usize {
        self.state
            .borrow()
            .listeners
            .values()
            .filter(|l| l.target == target && &l.kind == kind)
            .count()
    }

    /// Total number of installed listeners.
    #[must_use]
    pub fn total_listeners(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    fn install(&self, target: EventTarget, kind: EventKind, once: bool, handler: Handler) -> ListenerId {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = ListenerId::new(state.next_id);
        state.listeners.insert(
            id,
            Listener {
                target,
                kind,
                once,
                handler,
            },
        );
        id
    }
}

impl EventBus for FakeEventBus {
    fn listen(&self, target: EventTarget, kind: EventKind, handler: Handler) -> ListenerId {
        self.install(target, kind, false, handler)
    }

    fn listen_once(&self, target: EventTarget, kind: EventKind, handler: Handler) -> ListenerId {
        self.install(target, kind, true, handler)
    }

    fn unlisten(&self, id: ListenerId) {
        // Drop the handler outside the borrow; it may own bus references.
        let removed = self.state.borrow_mut().listeners.remove(&id);
        drop(removed);
    }
}
