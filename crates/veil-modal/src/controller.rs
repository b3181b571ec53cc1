#![forbid(unsafe_code)]

//! The modal lifecycle controller.
//!
//! # Invariants
//!
//! 1. The overlay root and its close affordance are stored together
//!    (`OverlayInstance`), so they are present or absent together.
//! 2. At most one overlay instance exists per controller. `create` closes
//!    the previous one first.
//! 3. Dismissal triggers are installed only while an overlay exists and are
//!    cleared at the start of every `close`.
//! 4. Templates are parsed at most once per controller and never mutated
//!    after the extra class is applied.
//! 5. No `RefCell` borrow is held while lifecycle listeners run.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Unparsable template | Bad markup | `create` returns `ModalError::Template` |
//! | Missing insertion point | Selector absent from template | `ModalError::MissingInsertionPoint`, content not moved |
//! | No transition support | Adapter reports `Unsupported` | Animated close completes immediately |
//! | Never-loading element | Broken media | `Load` never fires |
//! | Use after `destroy` | Caller bug | `create` errors, other calls are logged no-ops |
//!
//! Deferred steps (trigger wiring, open finishing) capture the overlay
//! generation they were scheduled for and do nothing if that overlay has
//! since been closed or replaced.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use veil_core::{
    Dom, DomEvent, EventKind, EventTarget, Host, KEY_ESCAPE, ListenerId, NodeId, TransitionSupport,
};

use crate::config::ModalConfig;
use crate::error::{InsertionRole, ModalError, TemplateKind};
use crate::event::{Callback, Listeners, ModalEvent, Subscription};
use crate::load::LoadBarrier;
use crate::trigger::DismissalTrigger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Templates {
    overlay: NodeId,
    close: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OverlayInstance {
    root: NodeId,
    close: NodeId,
    generation: u64,
}

/// An animated close waiting for its transition-end signal.
#[derive(Debug)]
struct PendingClose {
    root: NodeId,
    listener: ListenerId,
}

struct ModalState {
    content: Option<NodeId>,
    templates: Option<Templates>,
    overlay: Option<OverlayInstance>,
    click_trigger: DismissalTrigger,
    key_trigger: DismissalTrigger,
    generation: u64,
    pending_closes: Vec<PendingClose>,
    /// Barrier of the newest overlay; replaced (and cancelled) on `create`.
    barrier: Option<LoadBarrier>,
    destroyed: bool,
}

struct Inner {
    host: Host,
    config: ModalConfig,
    state: RefCell<ModalState>,
    listeners: Listeners,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        state.click_trigger.detach(&*self.host.events);
        state.key_trigger.detach(&*self.host.events);
    }
}

/// Builder for [`ModalController`], for registering listeners that must see
/// the events emitted during construction (`Open` when auto-showing).
pub struct ModalBuilder {
    host: Host,
    content: NodeId,
    config: ModalConfig,
    listeners: Vec<Rc<Callback>>,
}

impl ModalBuilder {
    pub fn config(mut self, config: ModalConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a listener owned by the controller for its whole lifetime.
    pub fn on_event(mut self, listener: impl Fn(&ModalController, ModalEvent) + 'static) -> Self {
        self.listeners.push(Rc::new(listener));
        self
    }

    /// Build the overlay and auto-show it if configured.
    pub fn build(self) -> Result<ModalController, ModalError> {
        let controller = ModalController {
            inner: Rc::new(Inner {
                host: self.host,
                config: self.config,
                state: RefCell::new(ModalState {
                    content: Some(self.content),
                    templates: None,
                    overlay: None,
                    click_trigger: DismissalTrigger::click(),
                    key_trigger: DismissalTrigger::key_down(),
                    generation: 0,
                    pending_closes: Vec::new(),
                    barrier: None,
                    destroyed: false,
                }),
                listeners: Listeners::default(),
            }),
        };
        for listener in self.listeners {
            controller.inner.listeners.own(listener);
        }

        controller.create()?;
        if controller.inner.config.auto_show {
            controller.show(true);
        }
        Ok(controller)
    }
}

/// Overlay controller bound to one content element.
///
/// Cheap to clone: clones share the same overlay. Handlers installed on the
/// host hold weak references, so dropping every handle detaches the
/// dismissal triggers; call [`destroy`](Self::destroy) to also remove the
/// overlay from the document.
#[derive(Clone)]
pub struct ModalController {
    inner: Rc<Inner>,
}

impl std::fmt::Debug for ModalController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("ModalController")
            .field("content", &state.content)
            .field("overlay", &state.overlay)
            .field("destroyed", &state.destroyed)
            .finish_non_exhaustive()
    }
}

impl ModalController {
    /// Build a controller for `content` and run `create` (and `show` when
    /// `auto_show` is set).
    pub fn new(host: Host, content: NodeId, config: ModalConfig) -> Result<Self, ModalError> {
        Self::builder(host, content).config(config).build()
    }

    /// Start a builder with the default configuration.
    pub fn builder(host: Host, content: NodeId) -> ModalBuilder {
        ModalBuilder {
            host,
            content,
            config: ModalConfig::default(),
            listeners: Vec::new(),
        }
    }

    fn upgrade(weak: &Weak<Inner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn weak(&self) -> Weak<Inner> {
        Rc::downgrade(&self.inner)
    }

    // --- Accessors ---

    #[must_use]
    pub fn config(&self) -> &ModalConfig {
        &self.inner.config
    }

    /// The content element, until `destroy`.
    #[must_use]
    pub fn content(&self) -> Option<NodeId> {
        self.inner.state.borrow().content
    }

    /// Root of the live overlay instance.
    #[must_use]
    pub fn overlay(&self) -> Option<NodeId> {
        self.inner.state.borrow().overlay.map(|o| o.root)
    }

    /// Close affordance inside the live overlay instance.
    #[must_use]
    pub fn close_affordance(&self) -> Option<NodeId> {
        self.inner.state.borrow().overlay.map(|o| o.close)
    }

    /// Whether an overlay instance exists (shown or not).
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.state.borrow().overlay.is_some()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.inner.state.borrow().destroyed
    }

    /// Whether the document click handler is installed.
    #[must_use]
    pub fn click_dismissal_armed(&self) -> bool {
        self.inner.state.borrow().click_trigger.is_attached()
    }

    /// Whether the window escape handler is installed.
    #[must_use]
    pub fn escape_dismissal_armed(&self) -> bool {
        self.inner.state.borrow().key_trigger.is_attached()
    }

    /// Number of animated closes still waiting for a transition end.
    #[must_use]
    pub fn pending_closes(&self) -> usize {
        self.inner.state.borrow().pending_closes.len()
    }

    /// Number of live lifecycle listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Listen for lifecycle events until the returned guard is dropped.
    pub fn subscribe(
        &self,
        listener: impl Fn(&ModalController, ModalEvent) + 'static,
    ) -> Subscription {
        self.inner.listeners.subscribe(Rc::new(listener))
    }

    fn emit(&self, event: ModalEvent) {
        tracing::debug!(event = %event, "modal lifecycle");
        self.inner.listeners.emit(self, event);
    }

    fn is_current(&self, overlay: OverlayInstance) -> bool {
        let state = self.inner.state.borrow();
        !state.destroyed && state.overlay == Some(overlay)
    }

    // --- Lifecycle ---

    /// Build (or rebuild) the overlay without inserting it into the document.
    ///
    /// Moves the content element into the new overlay, starts the load
    /// barrier, and wires dismissal triggers on the next turn.
    pub fn create(&self) -> Result<(), ModalError> {
        let _span = tracing::debug_span!("modal_create").entered();

        if self.is_destroyed() {
            return Err(ModalError::Destroyed);
        }
        if self.is_open() {
            self.close(true);
        }

        let host = &self.inner.host;
        let config = &self.inner.config;
        let templates = self.templates()?;

        // Validate against the template so a failure leaves nothing behind.
        Self::insertion_point(&*host.dom, templates.overlay, config, InsertionRole::Close)?;
        Self::insertion_point(&*host.dom, templates.overlay, config, InsertionRole::Content)?;
        let content = self.content().ok_or(ModalError::Destroyed)?;

        let root = host.dom.deep_clone(templates.overlay);
        let close = host.dom.deep_clone(templates.close);
        let close_point = Self::insertion_point(&*host.dom, root, config, InsertionRole::Close)?;
        let content_point =
            Self::insertion_point(&*host.dom, root, config, InsertionRole::Content)?;

        host.dom.append_child(close_point, close);
        host.dom.append_child(content_point, content);

        let overlay = {
            let mut state = self.inner.state.borrow_mut();
            state.generation += 1;
            let overlay = OverlayInstance {
                root,
                close,
                generation: state.generation,
            };
            state.overlay = Some(overlay);
            overlay
        };

        let weak = self.weak();
        let barrier = LoadBarrier::wait(host, root, &config.loadable_elements, move || {
            if let Some(controller) = Self::upgrade(&weak) {
                controller.on_loaded();
            }
        });
        let replaced = self.inner.state.borrow_mut().barrier.replace(barrier);
        if let Some(mut old) = replaced {
            old.cancel(&*host.events);
        }

        // One turn late, so the click that opened us cannot dismiss us.
        let weak = self.weak();
        host.scheduler.defer(Box::new(move || {
            if let Some(controller) = Self::upgrade(&weak) {
                controller.wire_dismissal(overlay);
            }
        }));

        tracing::debug!(
            root = root.raw(),
            close = close.raw(),
            generation = overlay.generation,
            "overlay created"
        );
        Ok(())
    }

    /// Insert the overlay into the document and make it visible.
    ///
    /// No-op without an overlay. With `animate`, the open-transition class is
    /// applied now and removed on the next turn, when `OpenFinish` fires.
    pub fn show(&self, animate: bool) {
        let overlay = {
            let state = self.inner.state.borrow();
            if state.destroyed {
                tracing::warn!("show called on a destroyed modal");
                return;
            }
            match state.overlay {
                Some(overlay) => overlay,
                None => {
                    tracing::trace!("show without overlay ignored");
                    return;
                }
            }
        };

        let dom = &self.inner.host.dom;
        dom.set_visible(overlay.root, false);
        dom.append_to_body(overlay.root);
        self.emit(ModalEvent::Open);
        if !self.is_current(overlay) {
            return;
        }

        if !animate {
            self.finish_open(overlay, false);
            return;
        }

        dom.add_class(overlay.root, &self.inner.config.transition_open_class);
        dom.set_visible(overlay.root, true);
        let weak = self.weak();
        self.inner.host.scheduler.defer(Box::new(move || {
            if let Some(controller) = Self::upgrade(&weak) {
                controller.finish_open(overlay, true);
            }
        }));
    }

    fn finish_open(&self, overlay: OverlayInstance, animated: bool) {
        let dom = &self.inner.host.dom;
        // A close may already be waiting on this root; the class must still go.
        if animated {
            dom.remove_class(overlay.root, &self.inner.config.transition_open_class);
        }
        if !self.is_current(overlay) {
            tracing::trace!(generation = overlay.generation, "stale open finish skipped");
            return;
        }
        dom.set_visible(overlay.root, true);
        self.emit(ModalEvent::OpenFinish);
    }

    /// Dismiss the overlay.
    ///
    /// Always clears the dismissal triggers. Without an overlay that is all it
    /// does, so calling it defensively is safe. Otherwise the overlay
    /// reference is cleared before `CloseStart` fires, and the element is
    /// removed (firing `Close`) immediately or after its close transition.
    pub fn close(&self, animate: bool) {
        let overlay = {
            let mut state = self.inner.state.borrow_mut();
            if state.destroyed {
                tracing::warn!("close called on a destroyed modal");
                return;
            }
            let bus = &*self.inner.host.events;
            state.click_trigger.detach(bus);
            state.key_trigger.detach(bus);
            match state.overlay.take() {
                Some(overlay) => overlay,
                None => return,
            }
        };

        self.emit(ModalEvent::CloseStart);

        if !animate {
            self.finish_close(overlay.root);
            return;
        }

        let host = &self.inner.host;
        host.dom
            .add_class(overlay.root, &self.inner.config.transition_close_class);
        match host.dom.transition_support(overlay.root) {
            TransitionSupport::Unsupported => self.finish_close(overlay.root),
            TransitionSupport::Supported { event } => {
                let root = overlay.root;
                let weak = self.weak();
                let listener = host.events.listen(
                    EventTarget::Node(root),
                    EventKind::TransitionEnd(event),
                    Rc::new(move |event: &mut DomEvent| {
                        // Descendant transitions bubble here too; only ours counts.
                        if event.target.is_some_and(|target| target != root) {
                            return;
                        }
                        if let Some(controller) = Self::upgrade(&weak) {
                            controller.finish_close(root);
                        }
                    }),
                );
                self.inner
                    .state
                    .borrow_mut()
                    .pending_closes
                    .push(PendingClose { root, listener });
                tracing::trace!(root = root.raw(), "waiting for close transition");
            }
        }
    }

    fn finish_close(&self, root: NodeId) {
        let pending = {
            let mut state = self.inner.state.borrow_mut();
            let index = state.pending_closes.iter().position(|p| p.root == root);
            index.map(|index| state.pending_closes.swap_remove(index))
        };
        if let Some(pending) = pending {
            self.inner.host.events.unlisten(pending.listener);
        }
        self.inner.host.dom.detach(root);
        self.emit(ModalEvent::Close);
    }

    /// Tear everything down. Terminal: the controller must not be reused.
    ///
    /// Clears triggers, drops the templates, removes the current overlay and
    /// any overlay still closing, cancels the outstanding load barrier, releases
    /// the content element, and drops every lifecycle listener. Emits nothing.
    pub fn destroy(&self) {
        let (templates, overlay, pending, barrier) = {
            let mut state = self.inner.state.borrow_mut();
            if state.destroyed {
                tracing::warn!("destroy called twice");
                return;
            }
            state.destroyed = true;
            let bus = &*self.inner.host.events;
            state.click_trigger.detach(bus);
            state.key_trigger.detach(bus);
            state.content = None;
            (
                state.templates.take(),
                state.overlay.take(),
                std::mem::take(&mut state.pending_closes),
                state.barrier.take(),
            )
        };

        let host = &self.inner.host;
        for close in pending {
            host.events.unlisten(close.listener);
            host.dom.detach(close.root);
        }
        if let Some(mut barrier) = barrier {
            barrier.cancel(&*host.events);
        }
        if let Some(templates) = templates {
            host.dom.detach(templates.overlay);
            host.dom.detach(templates.close);
        }
        if let Some(overlay) = overlay {
            host.dom.detach(overlay.root);
        }
        self.inner.listeners.clear();
        tracing::debug!("modal destroyed");
    }

    // --- Internals ---

    fn templates(&self) -> Result<Templates, ModalError> {
        if let Some(templates) = self.inner.state.borrow().templates {
            return Ok(templates);
        }

        let dom = &self.inner.host.dom;
        let config = &self.inner.config;
        let overlay = dom
            .parse_fragment(config.overlay_template.trim())
            .map_err(|source| ModalError::Template {
                kind: TemplateKind::Overlay,
                source,
            })?;
        let close = dom
            .parse_fragment(config.close_template.trim())
            .map_err(|source| ModalError::Template {
                kind: TemplateKind::Close,
                source,
            })?;
        if let Some(extra) = &config.extra_class {
            dom.add_class(overlay, extra);
        }

        let templates = Templates { overlay, close };
        self.inner.state.borrow_mut().templates = Some(templates);
        Ok(templates)
    }

    fn insertion_point(
        dom: &dyn Dom,
        root: NodeId,
        config: &ModalConfig,
        role: InsertionRole,
    ) -> Result<NodeId, ModalError> {
        let selector = match role {
            InsertionRole::Content => &config.content_insertion_point,
            InsertionRole::Close => &config.close_insertion_point,
        };
        dom.query(root, selector)
            .ok_or_else(|| ModalError::MissingInsertionPoint {
                role,
                selector: selector.to_string(),
            })
    }

    fn on_loaded(&self) {
        match self.inner.config.load_settle_delay {
            None => self.emit_load(),
            Some(delay) => {
                let weak = self.weak();
                self.inner.host.scheduler.defer_for(
                    delay,
                    Box::new(move || {
                        if let Some(controller) = Self::upgrade(&weak) {
                            controller.emit_load();
                        }
                    }),
                );
            }
        }
    }

    fn emit_load(&self) {
        if self.is_destroyed() {
            return;
        }
        self.emit(ModalEvent::Load);
    }

    fn wire_dismissal(&self, overlay: OverlayInstance) {
        if !self.is_current(overlay) {
            tracing::trace!(generation = overlay.generation, "stale dismissal wiring skipped");
            return;
        }

        let background = self.inner.config.background_dismissal();
        let bus = &*self.inner.host.events;
        let mut state = self.inner.state.borrow_mut();

        let weak = self.weak();
        state.click_trigger.attach(
            bus,
            Rc::new(move |event: &mut DomEvent| {
                if let Some(controller) = Self::upgrade(&weak) {
                    controller.handle_click(event, background);
                }
            }),
        );

        if background {
            let weak = self.weak();
            state.key_trigger.attach(
                bus,
                Rc::new(move |event: &mut DomEvent| {
                    if event.key_code != Some(KEY_ESCAPE) {
                        return;
                    }
                    if let Some(controller) = Self::upgrade(&weak) {
                        tracing::debug!("escape pressed");
                        controller.close(true);
                    }
                }),
            );
        } else {
            state.key_trigger.detach(bus);
        }
    }

    fn handle_click(&self, event: &mut DomEvent, background: bool) {
        let Some(overlay) = self.inner.state.borrow().overlay else {
            return;
        };

        let dismiss = match event.target {
            Some(target) if target == overlay.close => true,
            Some(target)
                if target != overlay.root && self.inner.host.dom.contains(overlay.root, target) =>
            {
                false
            }
            // The overlay background itself, or anywhere outside it.
            _ => background,
        };
        if !dismiss {
            return;
        }

        event.prevent_default();
        event.stop_propagation();
        tracing::debug!(clicked = ?event.target, "dismissal click");
        self.close(true);
    }
}
