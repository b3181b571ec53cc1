#![forbid(unsafe_code)]

//! DOM adapter capability.
//!
//! Implementations own every node. The overlay controller only holds
//! [`NodeId`] handles and asks the adapter to move, clone, or mutate them.
//!
//! All methods take `&self`; adapters use interior mutability. Callers must
//! not hold adapter-internal borrows across calls (adapters never call back
//! into user code).

use core::fmt;

use crate::node::NodeId;
use crate::selector::Selector;

/// Whether the environment can signal the end of a class-driven transition.
///
/// Supplied by the adapter per node, replacing runtime style probing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransitionSupport {
    /// No completion signal; animated steps complete immediately.
    #[default]
    Unsupported,
    /// Completion is signalled by the named event.
    Supported { event: String },
}

impl TransitionSupport {
    /// Convenience constructor for the standard `transitionend` event.
    #[must_use]
    pub fn transitionend() -> Self {
        Self::Supported {
            event: "transitionend".to_string(),
        }
    }

    /// Name of the completion event, if supported.
    #[must_use]
    pub fn event_name(&self) -> Option<&str> {
        match self {
            Self::Unsupported => None,
            Self::Supported { event } => Some(event),
        }
    }
}

/// Errors reported by DOM adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// Markup could not be parsed.
    Parse { markup: String, reason: String },
    /// Markup parsed to nothing (or only whitespace).
    EmptyFragment,
    /// Markup parsed to more than one top-level element.
    MultipleRoots { count: usize },
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { markup, reason } => write!(f, "cannot parse '{markup}': {reason}"),
            Self::EmptyFragment => f.write_str("markup produced no element"),
            Self::MultipleRoots { count } => {
                write!(f, "markup produced {count} top-level elements, expected 1")
            }
        }
    }
}

impl std::error::Error for DomError {}

/// DOM manipulation primitives.
pub trait Dom {
    /// Parse markup into a single detached element.
    fn parse_fragment(&self, markup: &str) -> Result<NodeId, DomError>;

    /// Deep-clone a node. The clone is detached.
    fn deep_clone(&self, node: NodeId) -> NodeId;

    /// First descendant of `scope` (document order) matching `selector`.
    /// `scope` itself is never returned.
    fn query(&self, scope: NodeId, selector: &Selector) -> Option<NodeId>;

    /// All descendants of `scope` matching `selector`, in document order.
    fn query_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId>;

    /// Whether `node` itself matches `selector`.
    fn matches(&self, node: NodeId, selector: &Selector) -> bool;

    /// Whether `node` is a strict descendant of `ancestor`.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;

    /// Append `child` as the last child of `parent`, moving it from wherever
    /// it currently lives.
    fn append_child(&self, parent: NodeId, child: NodeId);

    /// Append `node` to the document body, moving it if attached elsewhere.
    fn append_to_body(&self, node: NodeId);

    /// Detach `node` from its parent (and from the document).
    fn detach(&self, node: NodeId);

    fn add_class(&self, node: NodeId, class: &str);

    fn remove_class(&self, node: NodeId, class: &str);

    /// Show or hide `node`.
    fn set_visible(&self, node: NodeId, visible: bool);

    /// Transition-capability descriptor for `node`.
    fn transition_support(&self, node: NodeId) -> TransitionSupport;
}
