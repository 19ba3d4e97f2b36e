// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::{Path, PathBuf};

/// Express an event path as an absolute path under `root`.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. the backend reports a different absolute prefix
///   for the same directory), we canonicalize the parent and try again.
///   The parent is used because removed paths no longer exist.
///
/// Returns `None` for the root itself and for paths outside it.
pub fn normalize_event_path(root: &Path, path: &Path) -> Option<PathBuf> {
    if let Ok(rel) = path.strip_prefix(root) {
        return (!rel.as_os_str().is_empty()).then(|| path.to_path_buf());
    }

    let name = path.file_name()?;
    let parent = path.parent()?.canonicalize().ok()?;
    let resolved = parent.join(name);
    match resolved.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => Some(resolved),
        _ => None,
    }
}
