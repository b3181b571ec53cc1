#![forbid(unsafe_code)]

//! Load-completion barrier.
//!
//! Waits for every loadable element in a scope (descendants matching a
//! selector, plus the scope itself when it matches) to signal `load`.
//!
//! # Invariants
//!
//! 1. The callback runs at most once.
//! 2. With zero loadable elements the callback runs on the next turn, never
//!    synchronously.
//! 3. With N elements the callback runs only after N distinct load signals.
//!
//! # Failure Modes
//!
//! - No timeout: an element that never loads leaves the barrier pending
//!   until it is cancelled.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use veil_core::{DomEvent, EventBus, EventKind, EventTarget, Host, ListenerId, NodeId, Selector};

struct BarrierState {
    total: usize,
    loaded: Cell<usize>,
    resolved: Cell<bool>,
    on_ready: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl BarrierState {
    fn record_load(&self) {
        let loaded = self.loaded.get() + 1;
        self.loaded.set(loaded);
        tracing::trace!(loaded, total = self.total, "load barrier progress");
        if loaded >= self.total {
            self.resolve();
        }
    }

    fn resolve(&self) {
        if self.resolved.replace(true) {
            return;
        }
        let on_ready = self.on_ready.borrow_mut().take();
        if let Some(on_ready) = on_ready {
            on_ready();
        }
    }
}

/// Pending wait for a set of elements to finish loading.
pub struct LoadBarrier {
    listeners: Vec<ListenerId>,
    state: Rc<BarrierState>,
}

impl LoadBarrier {
    /// Start waiting on loadable elements in `scope`; `on_ready` runs once
    /// all of them have loaded.
    pub fn wait(
        host: &Host,
        scope: NodeId,
        selector: &Selector,
        on_ready: impl FnOnce() + 'static,
    ) -> Self {
        let mut loadable = Vec::new();
        if host.dom.matches(scope, selector) {
            loadable.push(scope);
        }
        loadable.extend(host.dom.query_all(scope, selector));

        let state = Rc::new(BarrierState {
            total: loadable.len(),
            loaded: Cell::new(0),
            resolved: Cell::new(false),
            on_ready: RefCell::new(Some(Box::new(on_ready))),
        });

        if loadable.is_empty() {
            let pending = Rc::clone(&state);
            host.scheduler.defer(Box::new(move || pending.resolve()));
            return Self {
                listeners: Vec::new(),
                state,
            };
        }

        let listeners = loadable
            .into_iter()
            .map(|node| {
                let state = Rc::clone(&state);
                host.events.listen_once(
                    EventTarget::Node(node),
                    EventKind::Load,
                    Rc::new(move |_: &mut DomEvent| state.record_load()),
                )
            })
            .collect();

        Self { listeners, state }
    }

    /// Number of elements waited on.
    #[must_use]
    pub fn total(&self) -> usize {
        self.state.total
    }

    /// Number of load signals received.
    #[must_use]
    pub fn loaded(&self) -> usize {
        self.state.loaded.get()
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.state.resolved.get()
    }

    /// Stop waiting: detach outstanding listeners and drop the callback.
    pub fn cancel(&mut self, bus: &dyn EventBus) {
        for id in self.listeners.drain(..) {
            bus.unlisten(id);
        }
        let on_ready = self.state.on_ready.borrow_mut().take();
        drop(on_ready);
    }
}

impl std::fmt::Debug for LoadBarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadBarrier")
            .field("total", &self.total())
            .field("loaded", &self.loaded())
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
