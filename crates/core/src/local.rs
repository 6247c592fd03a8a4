//! Local file enumeration and key derivation

use crate::error::Result;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// An entry found under the upload root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Path as produced by the walk (root joined with the relative part)
    pub path: PathBuf,
    /// Remote key: the path relative to the root, `/` separated
    pub key: String,
    /// Directories are enumerated but never uploaded
    pub is_dir: bool,
}

/// Recursively enumerate every entry under `root`, dot-files included.
///
/// A root that does not exist yields an empty list. Entries are sorted by
/// file name within each directory so the order is stable across runs.
pub fn scan_local_files(root: &Path) -> Result<Vec<LocalFile>> {
    if !root.exists() {
        tracing::debug!(root = %root.display(), "upload root does not exist");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let relative = match entry.path().strip_prefix(root) {
            Ok(relative) => relative,
            Err(_) => continue,
        };

        files.push(LocalFile {
            key: path_to_key(relative),
            // Follows symlinks, so a link to a directory is skipped too
            is_dir: entry.path().is_dir(),
            path: entry.path().to_path_buf(),
        });
    }

    Ok(files)
}

/// Join the normal components of a relative path with `/`
fn path_to_key(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Guess the content type from the file name, first match wins.
pub fn guess_content_type(path: &Path) -> Option<String> {
    mime_guess::from_path(path).first().map(|mime| mime.to_string())
}
