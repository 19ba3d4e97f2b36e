// src/replicate/jail.rs

//! Root-confined path resolution.
//!
//! Every copy and remove resolves its path through a [`Jail`] first. A
//! relative path is accepted only if it stays lexically inside the root
//! and the deepest part of it that already exists canonicalizes to
//! somewhere under the canonical root, which catches symlinked escapes.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::errors::{Result, SyncError};

#[derive(Debug, Clone)]
pub struct Jail {
    root: PathBuf,
}

impl Jail {
    /// Confine operations to `root`, which must exist.
    pub fn new(root: &Path) -> Result<Self> {
        let root = root
            .canonicalize()
            .map_err(|source| SyncError::RootUnreachable {
                path: root.to_path_buf(),
                source,
            })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `abs` relative to the root, refusing paths outside it.
    pub fn relative<'a>(&self, abs: &'a Path) -> Result<&'a Path> {
        abs.strip_prefix(&self.root)
            .map_err(|_| self.escape(abs.to_path_buf()))
    }

    /// Absolute path for `rel`, verified to stay inside the root.
    pub fn resolve(&self, rel: &Path) -> Result<PathBuf> {
        if !is_local(rel) {
            return Err(self.escape(rel.to_path_buf()));
        }

        let joined = self.root.join(rel);
        let anchor = deepest_existing(&joined)?;
        if !anchor.starts_with(&self.root) {
            return Err(self.escape(joined));
        }
        Ok(joined)
    }

    fn escape(&self, path: PathBuf) -> SyncError {
        SyncError::Containment {
            path,
            root: self.root.clone(),
        }
    }
}

/// Only plain names (and `.`) are allowed; no roots, prefixes or `..`.
fn is_local(rel: &Path) -> bool {
    rel.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Canonical form of the longest prefix of `path` that exists on disk.
fn deepest_existing(path: &Path) -> Result<PathBuf> {
    let mut current = path;
    loop {
        match current.canonicalize() {
            Ok(canonical) => return Ok(canonical),
            Err(err) if err.kind() == io::ErrorKind::NotFound => match current.parent() {
                Some(parent) => current = parent,
                None => return Err(err.into()),
            },
            Err(err) => return Err(err.into()),
        }
    }
}
