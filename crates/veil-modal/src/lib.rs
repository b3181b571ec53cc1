#![forbid(unsafe_code)]

//! Modal overlay lifecycle controller.
//!
//! A [`ModalController`] takes an existing content element, builds a detached
//! overlay around it from markup templates, and drives it through
//! construction, display, dismissal and disposal:
//!
//! ```text
//!   create ──► show ──► (Open) ──► next tick ──► (OpenFinish)
//!     │                                              │
//!     │  load barrier ──► (Load)                     ▼
//!     │                                   close ──► (CloseStart) ──► transition end ──► (Close)
//!     ▼
//!   next tick: dismissal triggers wired (click, escape)
//! ```
//!
//! All environment access goes through the [`veil_core::Host`] capabilities.
//!
//! # Example
//!
//! ```ignore
//! use veil_modal::{ModalConfig, ModalController, ModalEvent};
//!
//! let modal = ModalController::builder(host, content)
//!     .config(ModalConfig::default().modal_mode(true))
//!     .on_event(|_, event| {
//!         if event == ModalEvent::Close {
//!             println!("closed");
//!         }
//!     })
//!     .build()?;
//! ```

mod config;
mod controller;
mod error;
mod event;
mod load;
mod trigger;

pub use config::ModalConfig;
pub use controller::{ModalBuilder, ModalController};
pub use error::{ConfigError, InsertionRole, ModalError, TemplateKind};
pub use event::{ModalEvent, Subscription};
pub use load::LoadBarrier;
pub use trigger::DismissalTrigger;
