//! File naming rules.
//!
//! Every on-disk artifact is named deterministically from its source: feeds
//! after the last URL path segment, images after the offer identifier. The
//! existence of `{key}.png` is the only record that an offer was processed,
//! so the identifier → filename → identifier round trip must be stable.

mod path;
mod sanitize;

pub use path::last_path_segment;
pub use sanitize::sanitize_component;

/// Extension of raw, background-removed and composited images.
pub const IMAGE_EXTENSION: &str = "png";

/// Fallback when a feed URL has no usable path segment.
const DEFAULT_FEED_FILENAME: &str = "feed.xml";

/// Local filename for a feed URL: its last path segment, sanitized.
///
/// - `feed_filename("https://shop.example.com/export/yandex.xml")` → `"yandex.xml"`
pub fn feed_filename(url: &str) -> String {
    let sanitized = last_path_segment(url)
        .map(|s| sanitize_component(&s, false))
        .unwrap_or_default();
    if sanitized.is_empty() {
        DEFAULT_FEED_FILENAME.to_string()
    } else {
        sanitized
    }
}

/// Cache key for an offer identifier.
///
/// Dots are folded to `_` so that [`identifier_of`] on the derived filename
/// yields the key again. Returns `None` when nothing usable remains.
pub fn image_key(offer_id: &str) -> Option<String> {
    let key = sanitize_component(offer_id, true);
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// `{key}.png` for an offer identifier.
pub fn image_filename(offer_id: &str) -> Option<String> {
    image_key(offer_id).map(|key| format!("{}.{}", key, IMAGE_EXTENSION))
}

/// `{prefix}_{original}` for a rewritten feed.
pub fn output_feed_filename(prefix: &str, original: &str) -> String {
    if prefix.is_empty() {
        original.to_string()
    } else {
        format!("{}_{}", prefix, original)
    }
}

/// Identifier encoded in a filename: the stem before the first `.`.
/// Hidden files such as `.gitkeep` yield `None`.
pub fn identifier_of(file_name: &str) -> Option<&str> {
    let stem = file_name.split('.').next().unwrap_or("");
    if stem.is_empty() {
        None
    } else {
        Some(stem)
    }
}
