//! Pretty-printing with a two-space indent and a UTF-8 declaration.

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::path::{Path, PathBuf};

use super::tree::{Element, Node};
use super::XmlError;
use crate::storage;

/// Serializes `root` as an indented document.
pub fn to_pretty_string(root: &Element) -> Result<String, XmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_err)?;
    write_element(&mut writer, root)?;
    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(write_err)
}

/// Writes `root` pretty-printed to `dir/file_name`, creating `dir` when
/// needed and replacing any existing file.
pub fn save_pretty(root: &Element, dir: &Path, file_name: &str) -> Result<PathBuf, XmlError> {
    let doc = to_pretty_string(root)?;
    let path = dir.join(file_name);
    storage::write_atomic(&path, doc.as_bytes()).map_err(|source| XmlError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

fn write_element(writer: &mut Writer<Vec<u8>>, el: &Element) -> Result<(), XmlError> {
    let mut start = BytesStart::new(el.name.as_str());
    for (k, v) in &el.attributes {
        start.push_attribute((k.as_str(), v.as_str()));
    }
    if el.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(write_err);
    }
    writer.write_event(Event::Start(start)).map_err(write_err)?;
    for child in &el.children {
        match child {
            Node::Element(c) => write_element(writer, c)?,
            Node::Text(t) => writer
                .write_event(Event::Text(BytesText::new(t)))
                .map_err(write_err)?,
            Node::CData(t) => writer
                .write_event(Event::CData(BytesCData::new(t.as_str())))
                .map_err(write_err)?,
            Node::Comment(t) => writer
                .write_event(Event::Comment(BytesText::from_escaped(t.as_str())))
                .map_err(write_err)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(el.name.as_str())))
        .map_err(write_err)
}

fn write_err(e: impl std::fmt::Display) -> XmlError {
    XmlError::Write(e.to_string())
}
