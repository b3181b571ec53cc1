#![forbid(unsafe_code)]

//! Lifecycle events and listener registration.
//!
//! Listeners are stored either strongly (registered through the builder,
//! owned by the controller) or weakly (registered through `subscribe`, owned
//! by the returned [`Subscription`]). Dead weak entries are pruned lazily on
//! the next emission.
//!
//! # Invariants
//!
//! 1. Listeners run in registration order.
//! 2. A listener registered while an event is being emitted does not see that
//!    event.
//! 3. No internal borrow is held while a listener runs, so listeners may call
//!    back into the controller.

use core::fmt;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::controller::ModalController;

/// Lifecycle events emitted by a [`ModalController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalEvent {
    /// `show` began, before any animation.
    Open,
    /// The overlay is fully visible.
    OpenFinish,
    /// Every loadable descendant signalled completion.
    Load,
    /// `close` began; the overlay reference is already cleared.
    CloseStart,
    /// The overlay element left the document.
    Close,
}

impl ModalEvent {
    /// Stable event name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::OpenFinish => "open-finish",
            Self::Load => "load",
            Self::CloseStart => "close-start",
            Self::Close => "close",
        }
    }
}

impl fmt::Display for ModalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub(crate) type Callback = dyn Fn(&ModalController, ModalEvent);

enum Entry {
    Owned(Rc<Callback>),
    Subscribed(Weak<Callback>),
}

impl Entry {
    fn live(&self) -> Option<Rc<Callback>> {
        match self {
            Self::Owned(callback) => Some(Rc::clone(callback)),
            Self::Subscribed(weak) => weak.upgrade(),
        }
    }
}

/// RAII guard for a lifecycle listener. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    _callback: Rc<Callback>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[derive(Default)]
pub(crate) struct Listeners {
    entries: RefCell<Vec<Entry>>,
}

impl Listeners {
    pub(crate) fn own(&self, callback: Rc<Callback>) {
        self.entries.borrow_mut().push(Entry::Owned(callback));
    }

    pub(crate) fn subscribe(&self, callback: Rc<Callback>) -> Subscription {
        self.entries
            .borrow_mut()
            .push(Entry::Subscribed(Rc::downgrade(&callback)));
        Subscription {
            _callback: callback,
        }
    }

    pub(crate) fn emit(&self, controller: &ModalController, event: ModalEvent) {
        let live: Vec<Rc<Callback>> = {
            let mut entries = self.entries.borrow_mut();
            entries.retain(|entry| match entry {
                Entry::Owned(_) => true,
                Entry::Subscribed(weak) => weak.strong_count() > 0,
            });
            entries.iter().filter_map(Entry::live).collect()
        };
        for callback in live {
            callback(controller, event);
        }
    }

    pub(crate) fn clear(&self) {
        // Take first so dropping callbacks cannot observe a live borrow.
        let entries = std::mem::take(&mut *self.entries.borrow_mut());
        drop(entries);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| entry.live().is_some())
            .count()
    }
}
