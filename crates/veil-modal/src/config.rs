#![forbid(unsafe_code)]

//! Modal configuration.

use core::time::Duration;

use veil_core::Selector;

#[cfg(feature = "config-file")]
use crate::error::ConfigError;

/// Default class applied while an overlay transitions in or out.
const DEFAULT_TRANSITION_CLASS: &str = "__transitioning";

const DEFAULT_OVERLAY_TEMPLATE: &str =
    r#"<div class="modal-container"><div class="modal"></div></div>"#;
const DEFAULT_CLOSE_TEMPLATE: &str =
    r#"<button class="modal__close" type="button">Close</button>"#;

/// Modal configuration, fixed for the lifetime of a controller.
///
/// Defaults produce a `.modal-container` wrapping a `.modal` box that holds
/// both the close button and the content, waiting on `img` and `iframe`
/// descendants before emitting `Load`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalConfig {
    /// Show immediately after construction.
    pub auto_show: bool,
    /// Only the close affordance dismisses (no background click, no escape).
    pub modal_mode: bool,
    pub transition_open_class: String,
    pub transition_close_class: String,
    /// Extra class added to every overlay instance.
    pub extra_class: Option<String>,
    pub overlay_template: String,
    pub close_template: String,
    /// Where the content element is appended inside the overlay.
    pub content_insertion_point: Selector,
    /// Where the close affordance is appended inside the overlay.
    pub close_insertion_point: Selector,
    /// Elements whose load must complete before `Load` is emitted.
    pub loadable_elements: Selector,
    /// Extra wait between the load barrier resolving and `Load`.
    pub load_settle_delay: Option<Duration>,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            auto_show: true,
            modal_mode: false,
            transition_open_class: DEFAULT_TRANSITION_CLASS.to_string(),
            transition_close_class: DEFAULT_TRANSITION_CLASS.to_string(),
            extra_class: None,
            overlay_template: DEFAULT_OVERLAY_TEMPLATE.to_string(),
            close_template: DEFAULT_CLOSE_TEMPLATE.to_string(),
            content_insertion_point: Selector::class("modal"),
            close_insertion_point: Selector::class("modal"),
            loadable_elements: Selector::tags(&["img", "iframe"]),
            load_settle_delay: None,
        }
    }
}

impl ModalConfig {
    pub fn auto_show(mut self, auto_show: bool) -> Self {
        self.auto_show = auto_show;
        self
    }

    pub fn modal_mode(mut self, modal_mode: bool) -> Self {
        self.modal_mode = modal_mode;
        self
    }

    pub fn transition_open_class(mut self, class: impl Into<String>) -> Self {
        self.transition_open_class = class.into();
        self
    }

    pub fn transition_close_class(mut self, class: impl Into<String>) -> Self {
        self.transition_close_class = class.into();
        self
    }

    pub fn extra_class(mut self, class: impl Into<String>) -> Self {
        self.extra_class = Some(class.into());
        self
    }

    pub fn overlay_template(mut self, markup: impl Into<String>) -> Self {
        self.overlay_template = markup.into();
        self
    }

    pub fn close_template(mut self, markup: impl Into<String>) -> Self {
        self.close_template = markup.into();
        self
    }

    pub fn content_insertion_point(mut self, selector: Selector) -> Self {
        self.content_insertion_point = selector;
        self
    }

    pub fn close_insertion_point(mut self, selector: Selector) -> Self {
        self.close_insertion_point = selector;
        self
    }

    pub fn loadable_elements(mut self, selector: Selector) -> Self {
        self.loadable_elements = selector;
        self
    }

    pub fn load_settle_delay(mut self, delay: Duration) -> Self {
        self.load_settle_delay = Some(delay);
        self
    }

    /// Whether background clicks and escape dismiss the overlay.
    #[must_use]
    pub fn background_dismissal(&self) -> bool {
        !self.modal_mode
    }

    /// Read a TOML document. Keys mirror the field names; the delay is
    /// `load_settle_delay_ms`. Missing keys keep their defaults.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: file::ConfigFile =
            toml::from_str(source).map_err(|err| ConfigError::Parse(err.to_string()))?;
        file.into_config()
    }

    /// Read a JSON document with the same keys as [`from_toml_str`](Self::from_toml_str).
    #[cfg(feature = "config-file")]
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let file: file::ConfigFile =
            serde_json::from_str(source).map_err(|err| ConfigError::Parse(err.to_string()))?;
        file.into_config()
    }
}

#[cfg(feature = "config-file")]
mod file {
    use core::time::Duration;

    use serde::Deserialize;
    use veil_core::Selector;

    use super::ModalConfig;
    use crate::error::ConfigError;

    #[derive(Debug, Deserialize)]
    #[serde(default, deny_unknown_fields)]
    pub(super) struct ConfigFile {
        auto_show: bool,
        modal_mode: bool,
        transition_open_class: String,
        transition_close_class: String,
        extra_class: Option<String>,
        overlay_template: String,
        close_template: String,
        content_insertion_point: String,
        close_insertion_point: String,
        loadable_elements: String,
        load_settle_delay_ms: Option<u64>,
    }

    impl Default for ConfigFile {
        fn default() -> Self {
            let base = ModalConfig::default();
            Self {
                auto_show: base.auto_show,
                modal_mode: base.modal_mode,
                transition_open_class: base.transition_open_class,
                transition_close_class: base.transition_close_class,
                extra_class: base.extra_class,
                overlay_template: base.overlay_template,
                close_template: base.close_template,
                content_insertion_point: base.content_insertion_point.to_string(),
                close_insertion_point: base.close_insertion_point.to_string(),
                loadable_elements: base.loadable_elements.to_string(),
                load_settle_delay_ms: None,
            }
        }
    }

    fn selector(field: &'static str, source: &str) -> Result<Selector, ConfigError> {
        Selector::parse(source).map_err(|source| ConfigError::Selector { field, source })
    }

    impl ConfigFile {
        pub(super) fn into_config(self) -> Result<ModalConfig, ConfigError> {
            Ok(ModalConfig {
                auto_show: self.auto_show,
                modal_mode: self.modal_mode,
                transition_open_class: self.transition_open_class,
                transition_close_class: self.transition_close_class,
                extra_class: self.extra_class,
                overlay_template: self.overlay_template,
                close_template: self.close_template,
                content_insertion_point: selector(
                    "content_insertion_point",
                    &self.content_insertion_point,
                )?,
                close_insertion_point: selector(
                    "close_insertion_point",
                    &self.close_insertion_point,
                )?,
                loadable_elements: selector("loadable_elements", &self.loadable_elements)?,
                load_settle_delay: self.load_settle_delay_ms.map(Duration::from_millis),
            })
        }
    }
}
