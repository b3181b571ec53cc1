#![forbid(unsafe_code)]

//! Event bus capability and the event vocabulary shared with adapters.

use core::fmt;
use std::rc::Rc;

use crate::node::NodeId;

/// Key code delivered for the Escape key.
pub const KEY_ESCAPE: u32 = 27;

/// Where a listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    /// Whole-document click surface.
    Document,
    /// Whole-window key surface.
    Window,
    /// A specific node.
    Node(NodeId),
}

/// Event type a listener reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    KeyDown,
    Load,
    /// Transition completion, under the adapter-reported event name.
    TransitionEnd(String),
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Click => f.write_str("click"),
            Self::KeyDown => f.write_str("keydown"),
            Self::Load => f.write_str("load"),
            Self::TransitionEnd(name) => f.write_str(name),
        }
    }
}

/// An event as seen by a listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
    pub kind: EventKind,
    /// Originating node, if any.
    pub target: Option<NodeId>,
    /// Key code for key events.
    pub key_code: Option<u32>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl DomEvent {
    /// Create an event of `kind` with no target.
    #[must_use]
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            target: None,
            key_code: None,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// A click originating at `target`.
    #[must_use]
    pub fn click(target: NodeId) -> Self {
        Self::new(EventKind::Click).with_target(target)
    }

    /// A key-down carrying `key_code`.
    #[must_use]
    pub fn key_down(key_code: u32) -> Self {
        Self {
            key_code: Some(key_code),
            ..Self::new(EventKind::KeyDown)
        }
    }

    /// Set the originating node.
    #[must_use]
    pub fn with_target(mut self, target: NodeId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    #[must_use]
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    #[must_use]
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Identifier for an installed listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Wrap a raw bus-assigned id.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw id value.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Listener callback.
pub type Handler = Rc<dyn Fn(&mut DomEvent)>;

/// Attach and detach listeners on ambient targets.
///
/// Handlers may call back into the bus (including `unlisten` on
/// themselves) while being dispatched.
pub trait EventBus {
    /// Install a persistent listener.
    fn listen(&self, target: EventTarget, kind: EventKind, handler: Handler) -> ListenerId;

    /// Install a listener that is removed before its first invocation.
    fn listen_once(&self, target: EventTarget, kind: EventKind, handler: Handler) -> ListenerId;

    /// Remove a listener. Unknown or already-removed ids are ignored.
    fn unlisten(&self, id: ListenerId);
}
