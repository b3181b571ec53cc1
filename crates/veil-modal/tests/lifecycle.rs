#![forbid(unsafe_code)]

//! Integration tests: create / show / close / destroy sequencing.

mod common;

use common::{build, containers_in_document};
use pretty_assertions::assert_eq;
use veil_core::{Dom, EventKind, EventTarget, Selector};
use veil_harness::TestHost;
use veil_modal::{InsertionRole, ModalConfig, ModalController, ModalError, ModalEvent};

// ============================================================================
// Construction
// ============================================================================

#[test]
fn create_moves_content_into_detached_overlay() {
    let env = TestHost::new();
    let (modal, content, log) = build(&env, ModalConfig::default().auto_show(false));

    let root = modal.overlay().unwrap();
    let close = modal.close_affordance().unwrap();
    assert!(!env.dom.is_attached(root));
    assert!(env.dom.contains(root, content));
    assert!(env.dom.contains(root, close));
    assert!(!env.dom.is_attached(content));
    assert!(log.events().is_empty());

    let inner = env.dom.query(root, &Selector::class("modal")).unwrap();
    assert_eq!(env.dom.children(inner), vec![close, content]);
}

#[test]
fn extra_class_applies_to_every_instance() {
    let env = TestHost::new();
    let (modal, _, _) = build(
        &env,
        ModalConfig::default().auto_show(false).extra_class("gallery"),
    );
    let first = modal.overlay().unwrap();
    modal.create().unwrap();
    let second = modal.overlay().unwrap();

    assert_ne!(first, second);
    assert!(env.dom.has_class(first, "gallery"));
    assert!(env.dom.has_class(second, "gallery"));
}

#[test]
fn templates_tolerate_surrounding_whitespace() {
    let env = TestHost::new();
    let config = ModalConfig::default()
        .auto_show(false)
        .overlay_template("\n  <div class=\"modal-container\"><div class=\"modal\"></div></div>\n")
        .close_template("  <a class=\"x\">x</a>  ");
    let (modal, _, _) = build(&env, config);
    let close = modal.close_affordance().unwrap();
    assert_eq!(env.dom.tag_name(close), "a");
}

#[test]
fn missing_insertion_point_leaves_content_in_place() {
    let env = TestHost::new();
    let content = common::content(&env);
    let config = ModalConfig::default()
        .content_insertion_point(Selector::class("body"))
        .auto_show(false);

    let err = ModalController::new(env.host(), content, config).unwrap_err();
    assert_eq!(
        err,
        ModalError::MissingInsertionPoint {
            role: InsertionRole::Content,
            selector: ".body".into(),
        }
    );
    assert_eq!(env.dom.parent(content), Some(env.dom.body()));
}

#[test]
fn missing_insertion_point_allocates_only_templates() {
    let env = TestHost::new();
    let content = common::content(&env);
    let before = env.dom.node_count();
    let config = ModalConfig::default().close_insertion_point(Selector::class("header"));

    let err = ModalController::new(env.host(), content, config).unwrap_err();
    assert!(matches!(
        err,
        ModalError::MissingInsertionPoint {
            role: InsertionRole::Close,
            ..
        }
    ));
    // Overlay template (two elements) plus close template (one), no clones.
    assert_eq!(env.dom.node_count(), before + 3);
}

#[test]
fn malformed_template_is_reported() {
    let env = TestHost::new();
    let content = common::content(&env);
    let config = ModalConfig::default().overlay_template("<div><span></div>");
    assert!(matches!(
        ModalController::new(env.host(), content, config),
        Err(ModalError::Template { .. })
    ));
}

#[test]
fn recreate_replaces_previous_overlay() {
    let env = TestHost::new();
    let (modal, content, log) = build(&env, ModalConfig::default());
    env.tick();
    let first = modal.overlay().unwrap();
    log.clear();

    modal.create().unwrap();
    let second = modal.overlay().unwrap();

    assert_ne!(first, second);
    assert_eq!(log.events(), vec![ModalEvent::CloseStart, ModalEvent::Close]);
    assert!(!env.dom.is_attached(first));
    assert!(env.dom.contains(second, content));

    modal.show(false);
    assert_eq!(containers_in_document(&env), vec![second]);
}

#[test]
fn recreate_during_close_transition_keeps_one_live_overlay() {
    let env = TestHost::with_transitions();
    let (modal, _, _) = build(&env, ModalConfig::default());
    env.tick();
    let first = modal.overlay().unwrap();

    modal.create().unwrap();
    modal.show(false);
    let second = modal.overlay().unwrap();
    assert_eq!(containers_in_document(&env), vec![first, second]);
    assert_eq!(modal.pending_closes(), 1);

    env.finish_transition(first);
    assert_eq!(containers_in_document(&env), vec![second]);
    assert_eq!(modal.pending_closes(), 0);
}

// ============================================================================
// Show
// ============================================================================

#[test]
fn show_without_animation_finishes_synchronously() {
    let env = TestHost::new();
    let (modal, _, log) = build(&env, ModalConfig::default().auto_show(false));

    modal.show(false);
    let root = modal.overlay().unwrap();
    assert_eq!(log.events(), vec![ModalEvent::Open, ModalEvent::OpenFinish]);
    assert!(env.dom.is_attached(root));
    assert!(env.dom.is_rendered(root));
}

#[test]
fn animated_show_applies_open_class_for_one_turn() {
    let env = TestHost::new();
    let config = ModalConfig::default().transition_open_class("is-opening");
    let (modal, _, log) = build(&env, config);
    let root = modal.overlay().unwrap();

    assert_eq!(log.events(), vec![ModalEvent::Open]);
    assert!(env.dom.has_class(root, "is-opening"));
    assert!(env.dom.is_visible(root));

    env.tick();
    assert!(!env.dom.has_class(root, "is-opening"));
    assert_eq!(log.count(ModalEvent::OpenFinish), 1);
}

#[test]
fn show_without_overlay_is_noop() {
    let env = TestHost::new();
    let (modal, _, log) = build(&env, ModalConfig::default().auto_show(false));
    env.settle();
    modal.close(false);
    log.clear();

    modal.show(true);
    env.settle();
    assert!(log.events().is_empty());
}

#[test]
fn close_before_open_finishes_skips_open_finish() {
    let env = TestHost::new();
    let config = ModalConfig::default()
        .transition_open_class("is-opening")
        .transition_close_class("is-closing");
    let (modal, _, log) = build(&env, config);
    let root = modal.overlay().unwrap();
    modal.close(true);
    env.settle();

    assert_eq!(log.count(ModalEvent::OpenFinish), 0);
    assert_eq!(log.count(ModalEvent::Close), 1);
    assert!(!env.dom.has_class(root, "is-opening"));
    assert!(env.dom.has_class(root, "is-closing"));
}

#[test]
fn interrupted_open_still_drops_open_class() {
    let env = TestHost::with_transitions();
    let config = ModalConfig::default()
        .transition_open_class("is-opening")
        .transition_close_class("is-closing");
    let (modal, _, log) = build(&env, config);
    let first = modal.overlay().unwrap();

    modal.create().unwrap();
    env.tick();
    assert_eq!(env.dom.classes(first), vec!["modal-container", "is-closing"]);
    assert!(env.dom.is_attached(first));

    env.finish_transition(first);
    assert!(!env.dom.is_attached(first));
    assert_eq!(log.count(ModalEvent::Close), 1);
}

#[test]
fn recreate_before_first_tick_with_shared_class_removes_prior() {
    let env = TestHost::with_transitions();
    let (modal, _, log) = build(&env, ModalConfig::default());
    let first = modal.overlay().unwrap();

    modal.create().unwrap();
    env.tick();
    assert!(!env.dom.has_class(first, "__transitioning"));

    env.finish_transition(first);
    assert!(!env.dom.is_attached(first));
    assert_eq!(log.count(ModalEvent::Close), 1);
    assert_eq!(modal.pending_closes(), 0);
}

// ============================================================================
// Close
// ============================================================================

#[test]
fn close_without_overlay_emits_nothing() {
    let env = TestHost::new();
    let (modal, _, log) = build(&env, ModalConfig::default().auto_show(false));
    env.settle();
    modal.close(false);
    log.clear();

    modal.close(true);
    modal.close(false);
    env.settle();
    assert!(log.events().is_empty());
    assert!(!modal.is_open());
}

#[test]
fn close_clears_reference_before_close_start() {
    let env = TestHost::new();
    let content = common::content(&env);
    let modal = ModalController::new(env.host(), content, ModalConfig::default()).unwrap();
    let seen = std::rc::Rc::new(std::cell::Cell::new(None));
    let s = std::rc::Rc::clone(&seen);
    let _sub = modal.subscribe(move |ctl, event| {
        if event == ModalEvent::CloseStart {
            s.set(Some(ctl.is_open()));
        }
    });

    modal.close(false);
    assert_eq!(seen.get(), Some(false));
}

#[test]
fn animated_close_without_transition_support_completes_immediately() {
    let env = TestHost::new();
    let config = ModalConfig::default().transition_close_class("is-closing");
    let (modal, _, log) = build(&env, config);
    env.tick();
    let root = modal.overlay().unwrap();
    log.clear();

    modal.close(true);
    assert_eq!(log.events(), vec![ModalEvent::CloseStart, ModalEvent::Close]);
    assert!(!env.dom.is_attached(root));
    assert!(env.dom.has_class(root, "is-closing"));
}

#[test]
fn animated_close_waits_for_transition_end() {
    let env = TestHost::with_transitions();
    let (modal, _, log) = build(&env, ModalConfig::default());
    env.tick();
    let root = modal.overlay().unwrap();
    log.clear();

    modal.close(true);
    assert_eq!(log.events(), vec![ModalEvent::CloseStart]);
    assert!(env.dom.is_attached(root));
    assert!(env.dom.has_class(root, "__transitioning"));
    assert_eq!(
        env.bus.listener_count(
            EventTarget::Node(root),
            &EventKind::TransitionEnd("transitionend".into())
        ),
        1
    );

    env.finish_transition(root);
    assert_eq!(log.events(), vec![ModalEvent::CloseStart, ModalEvent::Close]);
    assert!(!env.dom.is_attached(root));
}

#[test]
fn descendant_transition_does_not_complete_close() {
    let env = TestHost::with_transitions();
    let (modal, content, log) = build(&env, ModalConfig::default());
    env.tick();
    let root = modal.overlay().unwrap();
    modal.close(true);

    let mut event = veil_core::DomEvent::new(EventKind::TransitionEnd("transitionend".into()))
        .with_target(content);
    env.bus.dispatch(EventTarget::Node(root), &mut event);
    assert_eq!(log.count(ModalEvent::Close), 0);
    assert!(env.dom.is_attached(root));

    env.finish_transition(root);
    assert_eq!(log.count(ModalEvent::Close), 1);
    assert!(!env.dom.is_attached(root));
}

#[test]
fn reentrant_close_during_transition_closes_once() {
    let env = TestHost::with_transitions();
    let (modal, _, log) = build(&env, ModalConfig::default());
    env.tick();
    let root = modal.overlay().unwrap();

    modal.close(true);
    modal.close(true);
    modal.close(false);
    env.finish_transition(root);
    env.finish_transition(root);

    assert_eq!(log.count(ModalEvent::CloseStart), 1);
    assert_eq!(log.count(ModalEvent::Close), 1);
}

#[test]
fn listener_may_reopen_from_close() {
    let env = TestHost::new();
    let content = common::content(&env);
    let modal = ModalController::new(env.host(), content, ModalConfig::default()).unwrap();
    let _sub = modal.subscribe(|ctl, event| {
        if event == ModalEvent::Close && !ctl.is_open() {
            ctl.create().unwrap();
        }
    });

    modal.close(false);
    assert!(modal.is_open());
    assert!(env.dom.contains(modal.overlay().unwrap(), content));
}

// ============================================================================
// Destroy
// ============================================================================

#[test]
fn destroy_releases_everything() {
    let env = TestHost::with_transitions();
    let (modal, content, log) = build(&env, ModalConfig::default());
    env.tick();
    assert!(env.bus.total_listeners() > 0);

    modal.destroy();
    assert!(modal.is_destroyed());
    assert!(!modal.is_open());
    assert_eq!(modal.content(), None);
    assert_eq!(modal.listener_count(), 0);
    assert_eq!(env.bus.total_listeners(), 0);
    assert!(containers_in_document(&env).is_empty());
    assert!(!env.dom.is_attached(content));
    assert_eq!(log.count(ModalEvent::Close), 0);
}

#[test]
fn destroy_cancels_pending_close() {
    let env = TestHost::with_transitions();
    let (modal, _, log) = build(&env, ModalConfig::default());
    env.tick();
    let root = modal.overlay().unwrap();
    modal.close(true);

    modal.destroy();
    assert_eq!(env.bus.total_listeners(), 0);
    assert!(!env.dom.is_attached(root));
    assert_eq!(env.finish_transition(root), 0);
    assert_eq!(log.count(ModalEvent::Close), 0);
}

#[test]
fn destroyed_controller_rejects_create_and_ignores_the_rest() {
    let env = TestHost::new();
    let (modal, _, log) = build(&env, ModalConfig::default());
    modal.destroy();
    log.clear();

    assert_eq!(modal.create(), Err(ModalError::Destroyed));
    modal.show(false);
    modal.close(false);
    modal.destroy();
    env.settle();
    assert!(log.events().is_empty());
    assert_eq!(env.bus.total_listeners(), 0);
}

#[test]
fn dropping_last_handle_detaches_triggers() {
    let env = TestHost::new();
    let (modal, _, _) = build(&env, ModalConfig::default());
    env.tick();
    assert_eq!(
        env.bus
            .listener_count(EventTarget::Document, &EventKind::Click),
        1
    );

    drop(modal);
    assert_eq!(
        env.bus
            .listener_count(EventTarget::Document, &EventKind::Click),
        0
    );
    assert_eq!(
        env.bus.listener_count(EventTarget::Window, &EventKind::KeyDown),
        0
    );
}
