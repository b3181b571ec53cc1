#![forbid(unsafe_code)]

//! Simple element selectors.
//!
//! A [`Selector`] is a comma-separated list of compound selectors. Each
//! compound is an optional tag name (or `*`) followed by any number of
//! `.class` and `#id` parts:
//!
//! ```
//! # use veil_core::Selector;
//! let sel = Selector::parse("img, iframe, .modal.large").unwrap();
//! assert_eq!(sel.alternatives(), 3);
//! ```
//!
//! # Invariants
//!
//! 1. A parsed selector always has at least one alternative, and every
//!    alternative carries at least one constraint or is the universal `*`.
//! 2. Tag names compare ASCII case-insensitively; classes and ids compare
//!    exactly.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Result |
//! |---------|-------|--------|
//! | Empty alternative | `""`, `"a,,b"`, trailing comma | `SelectorError::EmptyAlternative` |
//! | Combinator | `".a .b"`, `"a > b"` | `SelectorError::UnsupportedCombinator` |
//! | Bare `.` / `#` | `".", "div#"` | `SelectorError::EmptyName` |
//! | Anything else | `"[href]"`, `":hover"` | `SelectorError::UnexpectedCharacter` |

use core::fmt;
use core::iter::Peekable;
use core::str::{CharIndices, FromStr};

/// Read-only view of an element, as needed for selector matching.
pub trait ElementView {
    /// Lowercase tag name.
    fn tag_name(&self) -> &str;

    /// The element's `id` attribute, if any.
    fn element_id(&self) -> Option<&str>;

    /// Whether the element's class list contains `class`.
    fn has_class(&self, class: &str) -> bool;
}

/// Errors from [`Selector::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    /// An alternative between commas was blank.
    EmptyAlternative { index: usize },
    /// A descendant or sibling combinator was used.
    UnsupportedCombinator { alternative: String },
    /// `.` or `#` was not followed by a name.
    EmptyName { alternative: String, position: usize },
    /// A character outside the supported grammar.
    UnexpectedCharacter {
        alternative: String,
        character: char,
        position: usize,
    },
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyAlternative { index } => {
                write!(f, "selector alternative {index} is empty")
            }
            Self::UnsupportedCombinator { alternative } => {
                write!(f, "combinators are not supported: '{alternative}'")
            }
            Self::EmptyName {
                alternative,
                position,
            } => write!(f, "missing name at {position} in '{alternative}'"),
            Self::UnexpectedCharacter {
                alternative,
                character,
                position,
            } => write!(
                f,
                "unexpected '{character}' at {position} in '{alternative}'"
            ),
        }
    }
}

impl std::error::Error for SelectorError {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn parse(alternative: &str) -> Result<Self, SelectorError> {
        let mut compound = Self::default();
        let mut chars = alternative.char_indices().peekable();

        match chars.peek() {
            Some(&(_, '*')) => {
                chars.next();
            }
            Some(&(_, c)) if is_name_char(c) => {
                compound.tag = Some(take_name(&mut chars).to_ascii_lowercase());
            }
            _ => {}
        }

        while let Some((position, c)) = chars.next() {
            match c {
                '.' | '#' => {
                    let name = take_name(&mut chars);
                    if name.is_empty() {
                        return Err(SelectorError::EmptyName {
                            alternative: alternative.to_string(),
                            position,
                        });
                    }
                    if c == '.' {
                        compound.classes.push(name);
                    } else {
                        compound.id = Some(name);
                    }
                }
                c if c.is_whitespace() || matches!(c, '>' | '+' | '~') => {
                    return Err(SelectorError::UnsupportedCombinator {
                        alternative: alternative.to_string(),
                    });
                }
                character => {
                    return Err(SelectorError::UnexpectedCharacter {
                        alternative: alternative.to_string(),
                        character,
                        position,
                    });
                }
            }
        }

        Ok(compound)
    }

    fn matches(&self, element: &impl ElementView) -> bool {
        if let Some(tag) = &self.tag
            && !element.tag_name().eq_ignore_ascii_case(tag)
        {
            return false;
        }
        if let Some(id) = &self.id
            && element.element_id() != Some(id.as_str())
        {
            return false;
        }
        self.classes.iter().all(|class| element.has_class(class))
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn take_name(chars: &mut Peekable<CharIndices<'_>>) -> String {
    let mut name = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if !is_name_char(c) {
            break;
        }
        name.push(c);
        chars.next();
    }
    name
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Compound>,
}

impl Selector {
    /// Parse a selector list such as `"img,iframe"` or `".modal"`.
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let mut alternatives = Vec::new();
        for (index, part) in source.split(',').enumerate() {
            let part = part.trim();
            if part.is_empty() {
                return Err(SelectorError::EmptyAlternative { index });
            }
            alternatives.push(Compound::parse(part)?);
        }
        Ok(Self {
            source: source.trim().to_string(),
            alternatives,
        })
    }

    /// Selector matching elements that carry `class`.
    ///
    /// The name is taken verbatim; no parsing happens.
    #[must_use]
    pub fn class(class: &str) -> Self {
        Self {
            source: format!(".{class}"),
            alternatives: vec![Compound {
                classes: vec![class.to_string()],
                ..Compound::default()
            }],
        }
    }

    /// Selector matching any of the given tag names.
    #[must_use]
    pub fn tags(tags: &[&str]) -> Self {
        Self {
            source: tags.join(","),
            alternatives: tags
                .iter()
                .map(|tag| Compound {
                    tag: Some(tag.to_ascii_lowercase()),
                    ..Compound::default()
                })
                .collect(),
        }
    }

    /// Source text, trimmed.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Number of comma-separated alternatives.
    #[must_use]
    pub fn alternatives(&self) -> usize {
        self.alternatives.len()
    }

    /// Whether any alternative matches `element`.
    #[must_use]
    pub fn matches(&self, element: &impl ElementView) -> bool {
        self.alternatives.iter().any(|alt| alt.matches(element))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Selector {
    type Error = SelectorError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
