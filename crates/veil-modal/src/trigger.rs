#![forbid(unsafe_code)]

//! Dismissal triggers on ambient surfaces.
//!
//! Background-click and escape handlers live on shared targets (the whole
//! document, the whole window). Each controller owns one
//! [`DismissalTrigger`] per surface, so at most one handler of each kind is
//! installed per controller and removal never touches another controller's
//! handler.

use veil_core::{EventBus, EventKind, EventTarget, Handler, ListenerId};

/// A single owned listener slot on an ambient target.
#[derive(Debug)]
pub struct DismissalTrigger {
    target: EventTarget,
    kind: EventKind,
    listener: Option<ListenerId>,
}

impl DismissalTrigger {
    /// Trigger slot for `kind` events on `target`.
    #[must_use]
    pub fn new(target: EventTarget, kind: EventKind) -> Self {
        Self {
            target,
            kind,
            listener: None,
        }
    }

    /// Document-level click slot.
    #[must_use]
    pub fn click() -> Self {
        Self::new(EventTarget::Document, EventKind::Click)
    }

    /// Window-level key-down slot.
    #[must_use]
    pub fn key_down() -> Self {
        Self::new(EventTarget::Window, EventKind::KeyDown)
    }

    /// Install `handler`, replacing any handler this slot already holds.
    pub fn attach(&mut self, bus: &dyn EventBus, handler: Handler) {
        self.detach(bus);
        let id = bus.listen(self.target, self.kind.clone(), handler);
        tracing::trace!(listener = id.raw(), kind = %self.kind, "dismissal trigger attached");
        self.listener = Some(id);
    }

    /// Remove the installed handler, if any.
    pub fn detach(&mut self, bus: &dyn EventBus) {
        if let Some(id) = self.listener.take() {
            tracing::trace!(listener = id.raw(), kind = %self.kind, "dismissal trigger detached");
            bus.unlisten(id);
        }
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.listener.is_some()
    }
}
