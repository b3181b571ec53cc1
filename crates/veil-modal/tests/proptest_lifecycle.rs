#![forbid(unsafe_code)]

//! Property tests: arbitrary operation sequences keep the controller sane.

mod common;

use proptest::prelude::*;
use veil_core::NodeId;
use veil_harness::TestHost;
use veil_modal::{ModalConfig, ModalController, ModalEvent};

const OPEN_CLASS: &str = "is-opening";
const CLOSE_CLASS: &str = "is-closing";

#[derive(Debug, Clone, Copy)]
enum Op {
    Create,
    Show(bool),
    Close(bool),
    Tick,
    ClickBackground,
    ClickClose,
    ClickContent,
    Escape,
    FinishTransitions,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Create),
        any::<bool>().prop_map(Op::Show),
        any::<bool>().prop_map(Op::Close),
        Just(Op::Tick),
        Just(Op::ClickBackground),
        Just(Op::ClickClose),
        Just(Op::ClickContent),
        Just(Op::Escape),
        Just(Op::FinishTransitions),
    ]
}

fn closing(env: &TestHost) -> Vec<NodeId> {
    common::containers_in_document(env)
        .into_iter()
        .filter(|node| env.dom.has_class(*node, CLOSE_CLASS))
        .collect()
}

/// Every overlay root the controller has exposed, attached or not.
#[derive(Default)]
struct Roots(Vec<NodeId>);

impl Roots {
    fn record(&mut self, modal: &ModalController) {
        if let Some(root) = modal.overlay()
            && !self.0.contains(&root)
        {
            self.0.push(root);
        }
    }

    fn finish_transitions(&self, env: &TestHost) {
        for node in &self.0 {
            if env.dom.has_class(*node, CLOSE_CLASS) {
                env.finish_transition(*node);
            }
        }
    }
}

fn apply(env: &TestHost, modal: &ModalController, content: NodeId, roots: &Roots, op: Op) {
    match op {
        Op::Create => modal.create().unwrap(),
        Op::Show(animate) => modal.show(animate),
        Op::Close(animate) => modal.close(animate),
        Op::Tick => {
            env.tick();
        }
        Op::ClickBackground => {
            let target = modal.overlay().unwrap_or_else(|| env.dom.body());
            env.click(target);
        }
        Op::ClickClose => {
            if let Some(close) = modal.close_affordance() {
                env.click(close);
            }
        }
        Op::ClickContent => {
            env.click(content);
        }
        Op::Escape => {
            env.press_escape();
        }
        Op::FinishTransitions => roots.finish_transitions(env),
    }
}

fn check(
    env: &TestHost,
    modal: &ModalController,
    log: &common::EventLog,
) -> Result<(), TestCaseError> {
    if modal.click_dismissal_armed() || modal.escape_dismissal_armed() {
        prop_assert!(modal.is_open(), "armed trigger without overlay");
    }
    prop_assert_eq!(modal.overlay().is_some(), modal.close_affordance().is_some());

    let live: Vec<_> = common::containers_in_document(env)
        .into_iter()
        .filter(|node| !env.dom.has_class(*node, CLOSE_CLASS))
        .collect();
    prop_assert!(live.len() <= 1, "live overlays: {live:?}");

    prop_assert!(log.count(ModalEvent::Close) <= log.count(ModalEvent::CloseStart));
    prop_assert!(log.count(ModalEvent::OpenFinish) <= log.count(ModalEvent::Open));
    Ok(())
}

proptest! {
    #[test]
    fn operation_sequences_hold_invariants(
        transitions in any::<bool>(),
        modal_mode in any::<bool>(),
        ops in prop::collection::vec(op(), 1..40),
    ) {
        let env = if transitions { TestHost::with_transitions() } else { TestHost::new() };
        let config = ModalConfig::default()
            .modal_mode(modal_mode)
            .transition_open_class(OPEN_CLASS)
            .transition_close_class(CLOSE_CLASS);
        let (modal, content, log) = common::build(&env, config);
        let mut roots = Roots::default();
        roots.record(&modal);
        check(&env, &modal, &log)?;

        for op in ops {
            apply(&env, &modal, content, &roots, op);
            roots.record(&modal);
            check(&env, &modal, &log)?;
        }

        roots.finish_transitions(&env);
        env.settle();
        prop_assert_eq!(modal.pending_closes(), 0);
        prop_assert_eq!(log.count(ModalEvent::Close), log.count(ModalEvent::CloseStart));
        prop_assert!(closing(&env).is_empty());
    }

    #[test]
    fn destroy_after_any_sequence_releases_listeners(
        ops in prop::collection::vec(op(), 0..30),
    ) {
        let env = TestHost::with_transitions();
        let (modal, content, _) = common::build(&env, ModalConfig::default());
        let mut roots = Roots::default();
        for op in ops {
            apply(&env, &modal, content, &roots, op);
            roots.record(&modal);
        }
        modal.destroy();
        prop_assert_eq!(env.bus.total_listeners(), 0);
        prop_assert!(common::containers_in_document(&env).is_empty());
    }
}
