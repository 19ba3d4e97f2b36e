// src/tree/mod.rs

//! Point-in-time snapshots of a directory hierarchy.
//!
//! A [`Tree`] is an arena of [`Node`]s addressed by [`NodeId`]. Each node
//! records its parent id and the ids of its children, and every node is
//! also reachable through the tree's flat path index. Children of a
//! directory are kept sorted by name, which the diff relies on for its
//! binary search.
//!
//! Snapshots are never mutated after [`builder`] returns them; a new pass
//! builds new trees.

pub mod builder;

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs::{Metadata, Permissions};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub use builder::{build_constrained_tree, build_tree};

/// Index of a node inside its owning [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// One filesystem entry in a snapshot.
#[derive(Debug, Clone)]
pub struct Node {
    path: PathBuf,
    name: OsString,
    kind: EntryKind,
    size: u64,
    modified: Option<SystemTime>,
    permissions: Permissions,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub(crate) fn new(path: PathBuf, name: OsString, meta: &Metadata, parent: Option<NodeId>) -> Self {
        let kind = if meta.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        Self {
            path,
            name,
            kind,
            size: meta.len(),
            modified: meta.modified().ok(),
            permissions: meta.permissions(),
            parent,
            children: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &OsStr {
        &self.name
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Size in bytes as listed when the snapshot was taken.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    pub fn permissions(&self) -> &Permissions {
        &self.permissions
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child ids, sorted ascending by name.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// An owned snapshot: the node arena plus a path → id index.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    index: HashMap<PathBuf, NodeId>,
}

impl Tree {
    /// Start a tree containing only its root node.
    pub(crate) fn with_root(root: Node) -> Self {
        let path = root.path.clone();
        let mut index = HashMap::new();
        index.insert(path, NodeId(0));
        Self {
            nodes: vec![root],
            index,
        }
    }

    pub(crate) fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.index.insert(node.path.clone(), id);
        self.nodes.push(node);
        id
    }

    /// Attach `children` to `parent`, sorted by name.
    pub(crate) fn set_children(&mut self, parent: NodeId, mut children: Vec<NodeId>) {
        children.sort_by(|a, b| self.nodes[a.0].name.cmp(&self.nodes[b.0].name));
        self.nodes[parent.0].children = children;
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root_path(&self) -> &Path {
        &self.nodes[0].path
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Look up a node by absolute path.
    pub fn get(&self, path: &Path) -> Option<NodeId> {
        self.index.get(path).copied()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.index.contains_key(path)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.index.keys().map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Path of `id` relative to this tree's root (empty for the root itself).
    pub fn relative_path(&self, id: NodeId) -> &Path {
        let node = &self.nodes[id.0];
        node.path
            .strip_prefix(self.root_path())
            .unwrap_or(&node.path)
    }

    /// Find the child of `dir` called `name` using the sorted child list.
    pub fn find_child(&self, dir: NodeId, name: &OsStr) -> Option<NodeId> {
        let children = &self.nodes[dir.0].children;
        children
            .binary_search_by(|c| self.nodes[c.0].name.as_os_str().cmp(name))
            .ok()
            .map(|pos| children[pos])
    }

    /// `id` followed by all of its descendants, parents before children.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next.0].children.iter().rev());
        }
        out
    }

    /// Total size of the regular files at or below `id`.
    pub fn file_bytes(&self, id: NodeId) -> u64 {
        self.descendants(id)
            .into_iter()
            .map(|n| &self.nodes[n.0])
            .filter(|n| !n.is_dir())
            .map(|n| n.size)
            .sum()
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(self.root(), 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = self.node(id);
            let name = if id == self.root() {
                node.path.to_string_lossy()
            } else {
                node.name.to_string_lossy()
            };
            let suffix = if node.is_dir() { "/" } else { "" };
            writeln!(f, "{:indent$}{name}{suffix}", "", indent = depth * 2)?;
            for child in node.children.iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        Ok(())
    }
}
