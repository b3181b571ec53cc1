#![forbid(unsafe_code)]

//! Error types for modal construction and configuration.

use core::fmt;

use veil_core::{DomError, SelectorError};

/// Which configured template failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Overlay,
    Close,
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overlay => f.write_str("overlay"),
            Self::Close => f.write_str("close"),
        }
    }
}

/// Which insertion point could not be located in the overlay template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionRole {
    Content,
    Close,
}

impl fmt::Display for InsertionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content => f.write_str("content"),
            Self::Close => f.write_str("close"),
        }
    }
}

/// Errors from building an overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalError {
    /// A template's markup was rejected by the DOM adapter.
    Template { kind: TemplateKind, source: DomError },
    /// The overlay template has no descendant matching an insertion point.
    MissingInsertionPoint { role: InsertionRole, selector: String },
    /// The controller was destroyed.
    Destroyed,
}

impl fmt::Display for ModalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template { kind, source } => write!(f, "{kind} template: {source}"),
            Self::MissingInsertionPoint { role, selector } => write!(
                f,
                "overlay template has no {role} insertion point matching '{selector}'"
            ),
            Self::Destroyed => f.write_str("modal controller has been destroyed"),
        }
    }
}

impl std::error::Error for ModalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Template { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors from reading a configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A selector field did not parse.
    Selector {
        field: &'static str,
        source: SelectorError,
    },
    /// The document itself was malformed or had unknown keys.
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selector { field, source } => write!(f, "invalid selector for {field}: {source}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Selector { source, .. } => Some(source),
            Self::Parse(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn template_error_exposes_source() {
        let err = ModalError::Template {
            kind: TemplateKind::Close,
            source: DomError::EmptyFragment,
        };
        assert_eq!(err.to_string(), "close template: markup produced no element");
        assert!(err.source().is_some());
    }

    #[test]
    fn missing_insertion_point_message() {
        let err = ModalError::MissingInsertionPoint {
            role: InsertionRole::Content,
            selector: ".body".into(),
        };
        assert_eq!(
            err.to_string(),
            "overlay template has no content insertion point matching '.body'"
        );
    }
}
