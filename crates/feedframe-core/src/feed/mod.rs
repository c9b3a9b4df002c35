//! Catalog feeds: download and validation, offer/image extraction, and the
//! picture rewriter.

mod fetch;
mod offers;
mod rewrite;

pub use fetch::{FeedError, FeedFetcher, FetchSummary};
pub use offers::{extract_offer_images, OfferImage, OfferScan};
pub use rewrite::{FeedRewriter, ReplaceStats, RewriteError};

use std::path::Path;

use crate::xml::{self, Element, XmlError};

/// Parses `dir/file_name` into a tree.
pub fn load_tree(dir: &Path, file_name: &str) -> Result<Element, XmlError> {
    xml::parse_file(&dir.join(file_name))
}
