#![forbid(unsafe_code)]

//! The bundle of capabilities a host environment supplies.

use core::fmt;
use std::rc::Rc;

use crate::dom::Dom;
use crate::event::EventBus;
use crate::schedule::Scheduler;

/// Host capabilities, cheap to clone.
#[derive(Clone)]
pub struct Host {
    pub dom: Rc<dyn Dom>,
    pub events: Rc<dyn EventBus>,
    pub scheduler: Rc<dyn Scheduler>,
}

impl Host {
    /// Bundle three capability implementations.
    pub fn new(dom: Rc<dyn Dom>, events: Rc<dyn EventBus>, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            dom,
            events,
            scheduler,
        }
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host").finish_non_exhaustive()
    }
}
