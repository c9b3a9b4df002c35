//! Filesystem helpers: directory listing, directory creation and
//! full-overwrite writes that never leave a half-written target behind
//! (write to `.part`, then rename).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::FailureKind;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Why a directory listing produced no usable names.
#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("directory {} does not exist", .0.display())]
    Missing(PathBuf),
    #[error("directory {} contains no files", .0.display())]
    Empty(PathBuf),
    #[error("failed to read directory {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ListError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ListError::Missing(_) | ListError::Empty(_) => FailureKind::Validation,
            ListError::Io { .. } => FailureKind::Fatal,
        }
    }
}

/// Names of the regular files directly inside `dir`, sorted. Temp files
/// (`*.part`) are ignored.
///
/// A missing directory and a directory without files are reported as
/// distinct errors so callers can treat them as "nothing yet".
pub fn list_files(dir: &Path) -> Result<Vec<String>, ListError> {
    if !dir.is_dir() {
        return Err(ListError::Missing(dir.to_path_buf()));
    }
    let io_err = |source| ListError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if !entry.file_type().map_err(io_err)?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        // leftovers of an interrupted write
        if name.ends_with(TEMP_SUFFIX) {
            continue;
        }
        names.push(name);
    }
    if names.is_empty() {
        return Err(ListError::Empty(dir.to_path_buf()));
    }
    names.sort();
    tracing::debug!(dir = %dir.display(), count = names.len(), "listed files");
    Ok(names)
}

/// Creates `dir` and its parents if needed.
pub fn ensure_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

/// Path for the temp file: appends `.part` to the final path (e.g. `feed.xml` → `feed.xml.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Replaces `path` with `data`: writes the temp file, syncs it, then renames
/// over the target. Creates the parent directory when missing.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    let tmp = temp_path(path);
    {
        let mut f = fs::File::create(&tmp)?;
        io::Write::write_all(&mut f, data)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}
