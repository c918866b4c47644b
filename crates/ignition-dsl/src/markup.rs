//! Minimal element tree for start-event markup.
//!
//! Tag and attribute names are stored without their namespace prefix, so
//! `bpmn2:timerEventDefinition` and `timerEventDefinition` are the same
//! element as far as the compiler is concerned.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::error::{CompileError, CompileResult};

/// One element of a parsed fragment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Local tag name
    pub name: String,

    /// Attributes in document order, keyed by local name
    #[serde(default)]
    pub attributes: Vec<(String, String)>,

    /// Child elements in document order
    #[serde(default)]
    pub children: Vec<Element>,

    /// Concatenated character data directly inside this element
    #[serde(default)]
    pub text: String,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Value of the attribute with the given local name
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value, treating blank values as absent
    pub fn non_blank_attribute(&self, key: &str) -> Option<&str> {
        self.attribute(key).filter(|v| !v.trim().is_empty())
    }

    /// First child element with the given local name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Text content of this element and all its descendants
    pub fn text_content(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            out.push_str(&child.text_content());
        }
        out
    }
}

fn local_name(raw: &[u8]) -> String {
    let name = String::from_utf8_lossy(raw);
    match name.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => name.into_owned(),
    }
}

fn start_element(start: &BytesStart<'_>) -> CompileResult<Element> {
    let mut element = Element::new(local_name(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr?;
        let key = attr.key.as_ref();
        // namespace declarations are not attributes of the model
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let value = attr.unescape_value()?.into_owned();
        element.attributes.push((local_name(key), value));
    }
    Ok(element)
}

fn attach(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) -> CompileResult<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(CompileError::Markup(format!(
            "Fragment has more than one root element (found '{}')",
            element.name
        ))),
    }
}

/// Parse a markup fragment with a single root element into an [`Element`] tree.
pub fn parse_fragment(markup: &str) -> CompileResult<Element> {
    let mut reader = Reader::from_str(markup);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(start_element(&start)?),
            Event::Empty(start) => {
                let element = start_element(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| {
                    CompileError::Markup("Unbalanced closing tag".to_string())
                })?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let value = text.unescape()?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&value);
                } else if !value.trim().is_empty() {
                    return Err(CompileError::Markup(
                        "Text outside of the root element".to_string(),
                    ));
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            // comments, declarations, processing instructions, doctypes
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(CompileError::Markup(format!("Unclosed element '{}'", open.name)));
    }
    root.ok_or_else(|| CompileError::Markup("Fragment contains no element".to_string()))
}

/// Escape text or attribute content for output
pub fn escape(value: &str) -> String {
    quick_xml::escape::escape(value).into_owned()
}
