//! Minimal owned XML tree for catalog feeds.
//!
//! Parsing and writing go through `quick-xml`; the tree keeps elements,
//! attributes (in document order), text, CDATA and comments. Prolog items
//! other than the declaration are dropped, and the declaration is always
//! rewritten as UTF-8.

mod parse;
mod tree;
mod write;

pub use parse::{parse_document, parse_file};
pub use tree::{Element, Node};
pub use write::{save_pretty, to_pretty_string};

use std::path::PathBuf;

use crate::error::FailureKind;

#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("XML document is empty")]
    Empty,
    #[error("XML document is not valid UTF-8")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("XML syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },
    #[error("element <{0}> is never closed")]
    Unterminated(String),
    #[error("XML document has more than one root element")]
    MultipleRoots,
    #[error("XML document has no root element")]
    NoRoot,
    #[error("failed to serialize XML: {0}")]
    Write(String),
    #[error("XML file I/O failed for {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl XmlError {
    pub fn kind(&self) -> FailureKind {
        match self {
            XmlError::Write(_) | XmlError::Io { .. } => FailureKind::Fatal,
            _ => FailureKind::Validation,
        }
    }
}
