//! Event-driven tree builder on top of `quick_xml::Reader`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

use super::tree::{Element, Node};
use super::XmlError;

/// Validates and parses a whole document.
///
/// Rejects blank input, non-UTF-8 bytes, syntax errors, unclosed or
/// mismatched tags and documents without exactly one root element.
pub fn parse_document(bytes: &[u8]) -> Result<Element, XmlError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(XmlError::Empty);
    }
    let text = std::str::from_utf8(bytes)?;
    parse_str(text.strip_prefix('\u{feff}').unwrap_or(text))
}

/// Reads and parses a document from disk.
pub fn parse_file(path: &Path) -> Result<Element, XmlError> {
    let bytes = std::fs::read(path).map_err(|source| XmlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&bytes)
}

fn parse_str(text: &str) -> Result<Element, XmlError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| XmlError::Syntax {
            position: reader.buffer_position() as u64,
            message: e.to_string(),
        })?;
        match event {
            Event::Start(start) => stack.push(element_from(&start, &reader)?),
            Event::Empty(start) => {
                let el = element_from(&start, &reader)?;
                attach(&mut stack, &mut root, el)?;
            }
            Event::End(end) => {
                let el = stack.pop().ok_or_else(|| XmlError::Syntax {
                    position: reader.buffer_position() as u64,
                    message: format!(
                        "unexpected closing tag </{}>",
                        String::from_utf8_lossy(end.name().as_ref())
                    ),
                })?;
                attach(&mut stack, &mut root, el)?;
            }
            Event::Text(t) => {
                let value = t.unescape().map_err(|e| syntax(&reader, e))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Text(value.into_owned())),
                    None if value.trim().is_empty() => {}
                    None => {
                        return Err(XmlError::Syntax {
                            position: reader.buffer_position() as u64,
                            message: "text outside the root element".to_string(),
                        })
                    }
                }
            }
            Event::CData(c) => {
                if let Some(parent) = stack.last_mut() {
                    let value = String::from_utf8_lossy(&c.into_inner()).into_owned();
                    parent.children.push(Node::CData(value));
                }
            }
            Event::Comment(c) => {
                if let Some(parent) = stack.last_mut() {
                    let value = String::from_utf8_lossy(&c).into_owned();
                    parent.children.push(Node::Comment(value));
                }
            }
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::Unterminated(open.name.clone()));
    }
    root.ok_or(XmlError::NoRoot)
}

fn syntax(reader: &Reader<&[u8]>, e: impl std::fmt::Display) -> XmlError {
    XmlError::Syntax {
        position: reader.buffer_position() as u64,
        message: e.to_string(),
    }
}

fn element_from(start: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Element, XmlError> {
    let mut el = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(|e| syntax(reader, e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| syntax(reader, e))?;
        el.attributes.push((key, value.into_owned()));
    }
    Ok(el)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    el: Element,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(el));
        return Ok(());
    }
    if root.is_some() {
        return Err(XmlError::MultipleRoots);
    }
    *root = Some(el);
    Ok(())
}
