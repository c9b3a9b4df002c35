use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::FailureKind;
use crate::naming;
use crate::xml::{self, Element, XmlError};

#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("cannot load feed {file}: {source}")]
    Load {
        file: String,
        #[source]
        source: XmlError,
    },
    #[error("cannot save rewritten feed {file}: {source}")]
    Save {
        file: String,
        #[source]
        source: XmlError,
    },
}

impl RewriteError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RewriteError::Load { source, .. } | RewriteError::Save { source, .. } => source.kind(),
        }
    }
}

/// Pictures touched by [`FeedRewriter::replace_images`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceStats {
    pub removed: usize,
    pub added: usize,
}

/// One downloaded feed loaded for in-place edits.
#[derive(Debug, Clone)]
pub struct FeedRewriter {
    file_name: String,
    root: Element,
    modified: bool,
}

impl FeedRewriter {
    pub fn new(file_name: impl Into<String>, root: Element) -> Self {
        Self {
            file_name: file_name.into(),
            root,
            modified: false,
        }
    }

    /// Parses `dir/file_name`.
    pub fn load(dir: &Path, file_name: &str) -> Result<Self, RewriteError> {
        let root = super::load_tree(dir, file_name).map_err(|source| RewriteError::Load {
            file: file_name.to_string(),
            source,
        })?;
        Ok(Self::new(file_name, root))
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// For every offer whose key appears in `images` (identifier → final
    /// image filename), drops all `<picture>` children and appends one
    /// pointing at `{base_url}/{filename}`.
    pub fn replace_images(&mut self, images: &HashMap<String, String>, base_url: &str) -> ReplaceStats {
        let base = base_url.trim_end_matches('/');
        let mut stats = ReplaceStats::default();
        self.root.for_each_named_mut("offer", &mut |offer: &mut Element| {
            let Some(file) = offer
                .attr("id")
                .and_then(naming::image_key)
                .and_then(|key| images.get(&key))
            else {
                return;
            };
            let url = format!("{}/{}", base, file);
            stats.removed += offer.remove_children_named("picture");
            offer.push_child(Element::with_text("picture", url));
            stats.added += 1;
        });
        if stats.added > 0 {
            self.modified = true;
        }
        tracing::info!(
            file = %self.file_name,
            removed = stats.removed,
            added = stats.added,
            "pictures replaced"
        );
        stats
    }

    /// Removes offers under `<offers>` whose `<categoryId>` is 0. Offers with
    /// a missing or non-numeric category are kept. Returns the number removed.
    pub fn delete_uncategorized_offers(&mut self) -> usize {
        let file_name = &self.file_name;
        let Some(offers) = self.root.find_mut("offers") else {
            tracing::error!(file = %file_name, "no <offers> element");
            return 0;
        };
        let removed = offers.retain_elements(|el| {
            if el.name != "offer" {
                return true;
            }
            match el.child("categoryId").and_then(|c| c.text()) {
                Some(raw) => match raw.parse::<i64>() {
                    Ok(id) => id != 0,
                    Err(_) => {
                        tracing::warn!(
                            file = %file_name,
                            offer = el.attr("id").unwrap_or("?"),
                            category = %raw,
                            "non-numeric categoryId, keeping offer"
                        );
                        true
                    }
                },
                None => {
                    tracing::warn!(
                        file = %file_name,
                        offer = el.attr("id").unwrap_or("?"),
                        "offer has no categoryId, keeping it"
                    );
                    true
                }
            }
        });
        if removed > 0 {
            self.modified = true;
        }
        tracing::info!(file = %self.file_name, removed, "removed offers with categoryId 0");
        removed
    }

    /// Writes the tree to `dir/{prefix}_{file_name}`, modified or not.
    pub fn save(&mut self, dir: &Path, prefix: &str) -> Result<PathBuf, RewriteError> {
        let out_name = naming::output_feed_filename(prefix, &self.file_name);
        let path = xml::save_pretty(&self.root, dir, &out_name).map_err(|source| {
            RewriteError::Save {
                file: out_name.clone(),
                source,
            }
        })?;
        if self.modified {
            tracing::info!(path = %path.display(), "rewritten feed saved");
        } else {
            tracing::info!(path = %path.display(), "feed saved without changes");
        }
        self.modified = false;
        Ok(path)
    }
}
