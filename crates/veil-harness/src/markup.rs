#![forbid(unsafe_code)]

//! Minimal markup parser for templates used in tests.
//!
//! Supports elements, quoted and unquoted attributes, boolean attributes,
//! self-closing tags, void elements, comments, and text. Text is collapsed
//! into the enclosing element's `text` (interleaving with children is not
//! preserved). No entities, no doctype, no raw-text elements.

use core::fmt;

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A parsed element tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkupElement {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<MarkupElement>,
}

impl MarkupElement {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    /// Look up an attribute value.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Parse failure with byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupError {
    pub position: usize,
    pub message: String,
}

impl fmt::Display for MarkupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.message, self.position)
    }
}

impl std::error::Error for MarkupError {}

/// Parse `source` into its top-level elements.
pub fn parse(source: &str) -> Result<Vec<MarkupElement>, MarkupError> {
    Parser { src: source, pos: 0 }.run()
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn error(&self, message: impl Into<String>) -> MarkupError {
        MarkupError {
            position: self.pos,
            message: message.into(),
        }
    }

    fn run(mut self) -> Result<Vec<MarkupElement>, MarkupError> {
        let mut stack: Vec<MarkupElement> = Vec::new();
        let mut roots = Vec::new();

        while self.pos < self.src.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                let end = rest
                    .find("-->")
                    .ok_or_else(|| self.error("unterminated comment"))?;
                self.pos += end + 3;
            } else if let Some(body) = rest.strip_prefix("</") {
                let end = body
                    .find('>')
                    .ok_or_else(|| self.error("unterminated closing tag"))?;
                let name = body[..end].trim().to_ascii_lowercase();
                let open = stack
                    .pop()
                    .ok_or_else(|| self.error(format!("unexpected </{name}>")))?;
                if open.tag != name {
                    return Err(self.error(format!("expected </{}>, found </{name}>", open.tag)));
                }
                self.pos += end + 3;
                attach(&mut stack, &mut roots, open);
            } else if rest.starts_with('<') {
                let (element, self_closing) = self.open_tag()?;
                if self_closing || VOID_ELEMENTS.contains(&element.tag.as_str()) {
                    attach(&mut stack, &mut roots, element);
                } else {
                    stack.push(element);
                }
            } else {
                let end = rest.find('<').unwrap_or(rest.len());
                let text = rest[..end].trim();
                if !text.is_empty() {
                    let Some(parent) = stack.last_mut() else {
                        return Err(self.error("text outside of an element"));
                    };
                    if !parent.text.is_empty() {
                        parent.text.push(' ');
                    }
                    parent.text.push_str(text);
                }
                self.pos += end;
            }
        }

        if let Some(open) = stack.last() {
            return Err(self.error(format!("unclosed <{}>", open.tag)));
        }
        Ok(roots)
    }

    fn open_tag(&mut self) -> Result<(MarkupElement, bool), MarkupError> {
        self.pos += 1;
        let tag = self.take_name();
        if tag.is_empty() {
            return Err(self.error("missing tag name"));
        }
        let mut element = MarkupElement::new(tag);

        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("/>") {
                self.pos += 2;
                return Ok((element, true));
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return Ok((element, false));
            }
            if rest.is_empty() {
                return Err(self.error(format!("unterminated <{}>", element.tag)));
            }

            let name = self.take_name();
            if name.is_empty() {
                return Err(self.error("invalid attribute name"));
            }
            self.skip_whitespace();
            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                self.attr_value()?
            } else {
                String::new()
            };
            element.attrs.push((name.to_ascii_lowercase(), value));
        }
    }

    fn attr_value(&mut self) -> Result<String, MarkupError> {
        let rest = self.rest();
        match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &rest[1..];
                let end = body
                    .find(quote)
                    .ok_or_else(|| self.error("unterminated attribute value"))?;
                self.pos += end + 2;
                Ok(body[..end].to_string())
            }
            Some(_) => {
                let end = rest
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                let value = rest[..end].trim_end_matches('/');
                self.pos += value.len();
                Ok(value.to_string())
            }
            None => Err(self.error("missing attribute value")),
        }
    }

    fn take_name(&mut self) -> &'a str {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':')))
            .unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }
}

fn attach(stack: &mut [MarkupElement], roots: &mut Vec<MarkupElement>, element: MarkupElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => roots.push(element),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_elements_with_attributes() {
        let roots =
            parse(r#"<div class="modal-container"><div class="modal"></div></div>"#).unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].attr("class"), Some("modal-container"));
        assert_eq!(roots[0].children[0].attr("class"), Some("modal"));
    }

    #[test]
    fn text_and_boolean_attributes() {
        let roots = parse(r#"<button type=button disabled>Close</button>"#).unwrap();
        let button = &roots[0];
        assert_eq!(button.attr("type"), Some("button"));
        assert_eq!(button.attr("disabled"), Some(""));
        assert_eq!(button.text, "Close");
    }

    #[test]
    fn void_and_self_closing_elements() {
        let roots = parse(r#"<p><img src="a.png"><br/><iframe src='x'></iframe></p>"#).unwrap();
        let tags: Vec<_> = roots[0].children.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(tags, vec!["img", "br", "iframe"]);
    }

    #[test]
    fn comments_are_skipped() {
        let roots = parse("<!-- lead --><span></span>").unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].tag, "span");
    }

    #[test]
    fn mismatched_close_is_an_error() {
        let err = parse("<div><span></div>").unwrap_err();
        assert!(err.message.contains("expected </span>"));
    }

    #[test]
    fn unclosed_element_is_an_error() {
        let err = parse("<div>").unwrap_err();
        assert_eq!(err.message, "unclosed <div>");
    }

    #[test]
    fn stray_text_is_an_error() {
        assert!(parse("hello").is_err());
    }
}
