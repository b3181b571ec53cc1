#![forbid(unsafe_code)]

//! Deterministic host bundling the fake DOM, fake bus and a virtual clock.

use core::time::Duration;
use std::rc::Rc;

use veil_core::{
    Dom, DomEvent, EventKind, EventTarget, Host, KEY_ESCAPE, NodeId, TaskQueue,
};
use web_time::Instant;

use crate::bus::FakeEventBus;
use crate::dom::FakeDom;

/// Upper bound on turns for [`TestHost::settle`].
const SETTLE_TURNS: usize = 64;

/// Deterministic test environment.
///
/// Time only moves when the test calls [`advance`](Self::advance).
pub struct TestHost {
    pub dom: Rc<FakeDom>,
    pub bus: Rc<FakeEventBus>,
    pub queue: Rc<TaskQueue>,
    start: Instant,
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHost {
    /// Environment without transition support.
    #[must_use]
    pub fn new() -> Self {
        let start = Instant::now();
        Self {
            dom: Rc::new(FakeDom::new()),
            bus: Rc::new(FakeEventBus::new()),
            queue: Rc::new(TaskQueue::new(start)),
            start,
        }
    }

    /// Environment whose nodes report `transitionend` support.
    #[must_use]
    pub fn with_transitions() -> Self {
        let env = Self::new();
        env.dom
            .set_transition_support(veil_core::TransitionSupport::transitionend());
        env
    }

    /// Capability bundle for controllers under test.
    #[must_use]
    pub fn host(&self) -> Host {
        Host::new(
            Rc::clone(&self.dom) as Rc<dyn Dom>,
            Rc::clone(&self.bus) as Rc<dyn veil_core::EventBus>,
            Rc::clone(&self.queue) as Rc<dyn veil_core::Scheduler>,
        )
    }

    /// Parse `markup` and attach it to the body, as page content would be.
    ///
    /// # Panics
    ///
    /// Panics if the markup does not parse to exactly one element.
    pub fn element(&self, markup: &str) -> NodeId {
        let node = match self.dom.parse_fragment(markup) {
            Ok(node) => node,
            Err(err) => panic!("test markup failed to parse: {err}"),
        };
        self.dom.append_to_body(node);
        node
    }

    /// Run one turn at the current virtual time.
    pub fn tick(&self) -> usize {
        self.queue.run_turn(self.queue.now())
    }

    /// Run turns until nothing is due at the current virtual time.
    pub fn settle(&self) -> usize {
        self.queue.run_until_idle(SETTLE_TURNS)
    }

    /// Move virtual time forward by `by` and run one turn.
    pub fn advance(&self, by: Duration) -> usize {
        self.queue.run_turn(self.queue.now() + by)
    }

    /// Virtual time elapsed since creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.queue.now().duration_since(self.start)
    }

    /// Click `target`: bubble through node listeners from the target up to
    /// the body, then reach the document surface unless propagation stopped.
    pub fn click(&self, target: NodeId) -> DomEvent {
        let mut event = DomEvent::click(target);
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            self.bus.dispatch(EventTarget::Node(node), &mut event);
            if event.is_propagation_stopped() {
                return event;
            }
            cursor = self.dom.parent(node);
        }
        self.bus.dispatch(EventTarget::Document, &mut event);
        event
    }

    /// Deliver a key-down with `key_code` to the window surface.
    pub fn press_key(&self, key_code: u32) -> DomEvent {
        let mut event = DomEvent::key_down(key_code);
        self.bus.dispatch(EventTarget::Window, &mut event);
        event
    }

    pub fn press_escape(&self) -> DomEvent {
        self.press_key(KEY_ESCAPE)
    }

    /// Signal that `node` finished loading. Returns handlers invoked.
    pub fn fire_load(&self, node: NodeId) -> usize {
        let mut event = DomEvent::new(EventKind::Load).with_target(node);
        self.bus.dispatch(EventTarget::Node(node), &mut event)
    }

    /// Signal transition completion on `node`, using the event name the DOM
    /// reports. Returns handlers invoked (zero when unsupported).
    pub fn finish_transition(&self, node: NodeId) -> usize {
        let Some(name) = self.dom.transition_support(node).event_name().map(String::from) else {
            return 0;
        };
        let mut event = DomEvent::new(EventKind::TransitionEnd(name)).with_target(node);
        self.bus.dispatch(EventTarget::Node(node), &mut event)
    }
}
