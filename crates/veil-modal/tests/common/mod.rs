#![allow(dead_code)]

//! Shared fixtures for controller integration tests.

use std::cell::RefCell;
use std::rc::Rc;

use veil_core::{NodeId, Selector};
use veil_harness::TestHost;
use veil_modal::{ModalConfig, ModalController, ModalEvent};

pub const CONTENT: &str = r#"<section class="content"><p class="text">Hello</p></section>"#;

/// Lifecycle events in emission order.
#[derive(Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<ModalEvent>>>);

impl EventLog {
    pub fn events(&self) -> Vec<ModalEvent> {
        self.0.borrow().clone()
    }

    pub fn count(&self, event: ModalEvent) -> usize {
        self.0.borrow().iter().filter(|e| **e == event).count()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn push(&self, event: ModalEvent) {
        self.0.borrow_mut().push(event);
    }
}

/// Page content attached to the body, as a host page would have it.
pub fn content(env: &TestHost) -> NodeId {
    env.element(CONTENT)
}

/// Build a controller over fresh content, recording every lifecycle event
/// from construction on.
pub fn build(env: &TestHost, config: ModalConfig) -> (ModalController, NodeId, EventLog) {
    let content = content(env);
    let log = EventLog::default();
    let sink = log.clone();
    let modal = ModalController::builder(env.host(), content)
        .config(config)
        .on_event(move |_, event| sink.push(event))
        .build()
        .unwrap();
    (modal, content, log)
}

/// Attached overlay containers, including ones still closing.
pub fn containers_in_document(env: &TestHost) -> Vec<NodeId> {
    env.dom
        .find_in_document(&Selector::class("modal-container"))
}
