#![forbid(unsafe_code)]

//! Host capabilities consumed by veil overlays.
//!
//! The overlay controller never touches a document directly. Everything it
//! needs from the environment is expressed here as three narrow traits:
//!
//! - [`Dom`]: fragment parsing, cloning, queries, node movement, classes,
//!   visibility, and the transition-capability descriptor.
//! - [`EventBus`]: persistent and one-shot listeners on the document surface,
//!   the window surface, or individual nodes.
//! - [`Scheduler`]: deferral to the next turn of the host loop, or after a
//!   fixed delay.
//!
//! [`Host`] bundles one implementation of each. [`TaskQueue`] is a
//! host-pumped [`Scheduler`] for environments that drive their own loop.

pub mod dom;
pub mod event;
pub mod host;
pub mod node;
pub mod schedule;
pub mod selector;

pub use dom::{Dom, DomError, TransitionSupport};
pub use event::{DomEvent, EventBus, EventKind, EventTarget, Handler, KEY_ESCAPE, ListenerId};
pub use host::Host;
pub use node::NodeId;
pub use schedule::{Scheduler, Task, TaskQueue};
pub use selector::{ElementView, Selector, SelectorError};
