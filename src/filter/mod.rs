// src/filter/mod.rs

//! Path eligibility.
//!
//! Every snapshot, every watch event and every copy/remove goes through a
//! [`PathFilter`]. An entry is tracked only if it is not hidden and, for
//! regular files, its extension is on the allow-list (when one is set).
//! Any entry that cannot be checked is treated as not approved.

pub mod hidden;

use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::warn;

use crate::errors::{Result, SyncError};

pub use hidden::HiddenRule;

#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    hidden: HiddenRule,
    extensions: Option<GlobSet>,
}

impl PathFilter {
    /// Build a filter for the given extension allow-list.
    ///
    /// Extensions are expected without a leading dot; an empty list tracks
    /// every file.
    pub fn new(approved_extensions: &[String]) -> Result<Self> {
        Ok(Self {
            hidden: HiddenRule::platform(),
            extensions: compile_extensions(approved_extensions)?,
        })
    }

    pub fn has_extension_list(&self) -> bool {
        self.extensions.is_some()
    }

    /// Eligibility for an entry whose kind is already known (e.g. from a
    /// directory listing).
    pub fn is_approved_entry(&self, path: &Path, is_dir: bool) -> bool {
        match self.hidden.is_hidden(path) {
            Ok(true) => return false,
            Ok(false) => {}
            Err(err) => {
                warn!(path = %path.display(), error = %err, "hidden check failed; excluding path");
                return false;
            }
        }

        if is_dir {
            return true;
        }

        match (&self.extensions, path.file_name()) {
            (None, _) => true,
            (Some(set), Some(name)) => set.is_match(Path::new(name)),
            (Some(_), None) => false,
        }
    }

    /// Eligibility for an arbitrary path; stats it to learn its kind.
    pub fn is_approved(&self, path: &Path) -> bool {
        match std::fs::symlink_metadata(path) {
            Ok(meta) => self.is_approved_entry(path, meta.is_dir()),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot stat path; excluding it");
                false
            }
        }
    }

    /// Hidden check for paths that may no longer exist (removals).
    ///
    /// The platform rule applies while the path is still on disk. Once it
    /// is gone only the name is left, so the dot-prefix rule stands in.
    /// The extension allow-list is not consulted: a removed path's kind is
    /// unknown.
    pub fn is_approved_name(&self, path: &Path) -> bool {
        let rule = if std::fs::symlink_metadata(path).is_ok() {
            self.hidden
        } else {
            HiddenRule::DotPrefix
        };
        matches!(rule.is_hidden(path), Ok(false))
    }
}

fn compile_extensions(extensions: &[String]) -> Result<Option<GlobSet>> {
    if extensions.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for ext in extensions {
        let glob = GlobBuilder::new(&format!("*.{ext}"))
            .case_insensitive(true)
            .literal_separator(true)
            .build()
            .map_err(|e| SyncError::ConfigError(format!("invalid extension {ext:?}: {e}")))?;
        builder.add(glob);
    }

    let set = builder
        .build()
        .map_err(|e| SyncError::ConfigError(format!("invalid extension list: {e}")))?;
    Ok(Some(set))
}
