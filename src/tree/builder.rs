// src/tree/builder.rs

//! Single-pass, depth-first snapshot construction.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use crate::errors::{Result, SyncError};
use crate::filter::PathFilter;

use super::{Node, NodeId, Tree};

/// Snapshot everything approved by `filter` under `root`.
///
/// Fails only if `root` itself cannot be opened and listed. Subdirectories
/// that fail to list are kept as childless nodes and logged.
pub fn build_tree(root: &Path, filter: &PathFilter) -> Result<Tree> {
    TreeBuilder {
        filter,
        reference: None,
    }
    .build(root)
}

/// Snapshot `root`, keeping only entries whose path relative to `root` also
/// exists (relative to its own root) in `reference`.
///
/// Entries present on disk but unknown to `reference` never appear, so later
/// stages cannot act on them.
pub fn build_constrained_tree(reference: &Tree, root: &Path, filter: &PathFilter) -> Result<Tree> {
    TreeBuilder {
        filter,
        reference: Some(reference),
    }
    .build(root)
}

struct TreeBuilder<'a> {
    filter: &'a PathFilter,
    reference: Option<&'a Tree>,
}

impl TreeBuilder<'_> {
    fn build(&self, root: &Path) -> Result<Tree> {
        let unreachable = |source: io::Error| SyncError::RootUnreachable {
            path: root.to_path_buf(),
            source,
        };

        let meta = fs::metadata(root).map_err(unreachable)?;
        if !meta.is_dir() {
            return Err(unreachable(io::Error::new(
                io::ErrorKind::NotADirectory,
                "snapshot root is not a directory",
            )));
        }

        let name = root
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| root.as_os_str().to_os_string());
        let mut tree = Tree::with_root(Node::new(root.to_path_buf(), name, &meta, None));

        // The root must list; nested failures only prune their subtree.
        let root_id = tree.root();
        let mut stack = self.expand(&mut tree, root, root_id).map_err(unreachable)?;

        while let Some(dir) = stack.pop() {
            let dir_path = tree.node(dir).path().to_path_buf();
            match self.expand(&mut tree, root, dir) {
                Ok(subdirs) => stack.extend(subdirs),
                Err(err) => {
                    warn!(path = %dir_path.display(), error = %err, "skipping unreadable directory");
                }
            }
        }

        debug!(root = %root.display(), nodes = tree.len(), "snapshot built");
        Ok(tree)
    }

    /// List `dir`, add its approved children to the tree and return the ids
    /// of child directories still to be expanded.
    fn expand(&self, tree: &mut Tree, root: &Path, dir: NodeId) -> io::Result<Vec<NodeId>> {
        let dir_path = tree.node(dir).path().to_path_buf();
        let mut children = Vec::new();
        let mut subdirs = Vec::new();

        for entry in fs::read_dir(&dir_path)? {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    warn!(dir = %dir_path.display(), error = %err, "failed to read directory entry");
                    continue;
                }
            };

            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to read entry type");
                    continue;
                }
            };

            if file_type.is_symlink() {
                debug!(path = %path.display(), "skipping symlink");
                continue;
            }

            let is_dir = file_type.is_dir();
            if !self.filter.is_approved_entry(&path, is_dir) {
                if is_dir {
                    debug!(path = %path.display(), "pruning unapproved directory");
                }
                continue;
            }

            if !self.in_reference(root, &path) {
                continue;
            }

            let meta = match entry.metadata() {
                Ok(m) => m,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to stat entry");
                    continue;
                }
            };

            let id = tree.push(Node::new(path, entry.file_name(), &meta, Some(dir)));
            children.push(id);
            if is_dir {
                subdirs.push(id);
            }
        }

        tree.set_children(dir, children);
        Ok(subdirs)
    }

    fn in_reference(&self, root: &Path, path: &Path) -> bool {
        let Some(reference) = self.reference else {
            return true;
        };
        match path.strip_prefix(root) {
            Ok(rel) => reference.contains(&reference.root_path().join(rel)),
            Err(_) => false,
        }
    }
}
