//! Existing-item cache.
//!
//! The filesystem is the index: an offer counts as processed when a file
//! named after its key exists in the stage's output directory. The cache is
//! built once per pass by listing that directory and is never persisted.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::naming;
use crate::storage::{self, ListError};

/// Set of identifiers already present in an output directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingItems {
    ids: HashSet<String>,
}

impl ExistingItems {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `dir` and collects the identifier of every file in it.
    ///
    /// Pure read. A missing or empty directory is reported as
    /// `ListError::Missing` / `ListError::Empty`.
    pub fn scan(dir: &Path) -> Result<Self, ListError> {
        let ids = storage::list_files(dir)?
            .iter()
            .filter_map(|name| naming::identifier_of(name))
            .map(str::to_string)
            .collect();
        Ok(Self { ids })
    }

    /// Like [`scan`](Self::scan) but treats a missing or empty directory as
    /// an empty cache (the first run). Only I/O failures are returned.
    pub fn scan_or_empty(dir: &Path, what: &str) -> Result<Self, ListError> {
        match Self::scan(dir) {
            Ok(items) => {
                tracing::info!(dir = %dir.display(), count = items.len(), "built {} cache", what);
                Ok(items)
            }
            Err(ListError::Missing(_)) => {
                tracing::warn!(dir = %dir.display(), "{} directory is missing, assuming first run", what);
                Ok(Self::new())
            }
            Err(ListError::Empty(_)) => {
                tracing::warn!(dir = %dir.display(), "{} directory is empty, assuming first run", what);
                Ok(Self::new())
            }
            Err(e) => Err(e),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Records an identifier produced during the current pass. Returns
    /// `false` if it was already present.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Maps identifier → filename for every file in `dir`.
pub fn files_by_identifier(dir: &Path) -> Result<HashMap<String, String>, ListError> {
    Ok(storage::list_files(dir)?
        .into_iter()
        .filter_map(|name| naming::identifier_of(&name).map(|id| (id.to_string(), name.clone())))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn scan_collects_stems() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("A.png"), b"a").unwrap();
        fs::write(dir.path().join("B.png"), b"b").unwrap();
        let items = ExistingItems::scan(dir.path()).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.contains("A"));
        assert!(items.contains("B"));
        assert!(!items.contains("A.png"));
    }

    #[test]
    fn scan_skips_hidden_files_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".gitkeep"), b"").unwrap();
        fs::write(dir.path().join("7.png"), b"").unwrap();
        fs::create_dir(dir.path().join("8.png")).unwrap();
        let items = ExistingItems::scan(dir.path()).unwrap();
        assert_eq!(items.len(), 1);
        assert!(items.contains("7"));
    }

    #[test]
    fn scan_missing_dir_is_distinguishable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("old_images");
        assert!(matches!(
            ExistingItems::scan(&missing),
            Err(ListError::Missing(_))
        ));
        assert!(!missing.exists(), "scan must not create the directory");
    }

    #[test]
    fn scan_empty_dir_is_distinguishable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ExistingItems::scan(dir.path()),
            Err(ListError::Empty(_))
        ));
    }

    #[test]
    fn scan_or_empty_treats_first_run_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let items = ExistingItems::scan_or_empty(&dir.path().join("x"), "image").unwrap();
        assert!(items.is_empty());
        let items = ExistingItems::scan_or_empty(dir.path(), "image").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn insert_reports_duplicates() {
        let mut items = ExistingItems::new();
        assert!(items.insert("42"));
        assert!(!items.insert("42"));
    }

    #[test]
    fn files_by_identifier_maps_stem_to_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("15.png"), b"").unwrap();
        let map = files_by_identifier(dir.path()).unwrap();
        assert_eq!(map.get("15").map(String::as_str), Some("15.png"));
    }
}
