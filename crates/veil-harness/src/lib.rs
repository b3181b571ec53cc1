#![forbid(unsafe_code)]

//! Test harness for veil overlays.
//!
//! Provides a deterministic host: an arena-backed [`FakeDom`], a
//! [`FakeEventBus`] that simulates dispatch (including click bubbling), and a
//! [`TestHost`] that ties them to a virtual-clock [`TaskQueue`].
//!
//! ```ignore
//! let env = TestHost::new();
//! let content = env.element(r#"<p class="body">Hello</p>"#);
//! let modal = ModalController::new(env.host(), content, ModalConfig::default())?;
//! env.tick();
//! env.click(modal.overlay().unwrap());
//! ```
//!
//! [`TaskQueue`]: veil_core::TaskQueue

pub mod bus;
pub mod dom;
pub mod host;
pub mod markup;

pub use bus::FakeEventBus;
pub use dom::FakeDom;
pub use host::TestHost;
pub use markup::{MarkupElement, MarkupError};
