// src/diff.rs

//! Concurrent lock-step comparison of two snapshots.
//!
//! Every child of a source directory is checked by its own task. Matching
//! subdirectories fan out into further tasks; matching files are compared
//! under a semaphore permit. Anything unmatched or unequal is recorded
//! against the target directory it should live in. All tasks join before
//! [`find_missing`] returns.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::context::SyncContext;
use crate::tree::{NodeId, Tree};

/// Entries missing from (or divergent in) the target, grouped by the target
/// directory that should contain them.
///
/// Node ids refer to the tree the map was computed from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingMap {
    entries: BTreeMap<PathBuf, Vec<NodeId>>,
}

impl MissingMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dir: impl Into<PathBuf>, node: NodeId) {
        self.entries.entry(dir.into()).or_default().push(node);
    }

    pub fn get(&self, dir: &Path) -> Option<&[NodeId]> {
        self.entries.get(dir).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of directories with missing entries.
    pub fn dir_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of missing entries across all directories.
    pub fn entry_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[NodeId])> {
        self.entries
            .iter()
            .map(|(dir, nodes)| (dir.as_path(), nodes.as_slice()))
    }

    /// Bytes of regular files the entries (and their subtrees) hold in `tree`.
    pub fn file_bytes(&self, tree: &Tree) -> u64 {
        self.entries
            .values()
            .flatten()
            .map(|id| tree.file_bytes(*id))
            .sum()
    }

    /// Names per directory, for logs and dry runs.
    pub fn describe(&self, tree: &Tree) -> BTreeMap<PathBuf, Vec<String>> {
        self.entries
            .iter()
            .map(|(dir, nodes)| {
                let names = nodes
                    .iter()
                    .map(|id| tree.node(*id).name().to_string_lossy().into_owned())
                    .collect();
                (dir.clone(), names)
            })
            .collect()
    }

    fn sort_by_name(&mut self, tree: &Tree) {
        for nodes in self.entries.values_mut() {
            nodes.sort_by(|a, b| tree.node(*a).name().cmp(tree.node(*b).name()));
        }
    }
}

/// A source child checked against the target directory that should hold it.
#[derive(Debug, Clone, Copy)]
struct ChildCheck {
    source_child: NodeId,
    target_dir: NodeId,
}

/// Everything in `source` that `target` lacks or holds differently.
///
/// Not symmetric: entries only present in `target` are never reported.
pub async fn find_missing(ctx: &SyncContext, source: Arc<Tree>, target: Arc<Tree>) -> MissingMap {
    let missing = Arc::new(Mutex::new(MissingMap::new()));
    let mut tasks = JoinSet::new();

    let fan_out = |tasks: &mut JoinSet<Option<(NodeId, NodeId)>>, source_dir: NodeId, target_dir: NodeId| {
        for &source_child in source.node(source_dir).children() {
            let check = ChildCheck {
                source_child,
                target_dir,
            };
            tasks.spawn(check_child(
                ctx.permits().clone(),
                ctx.comparator().clone(),
                Arc::clone(&source),
                Arc::clone(&target),
                Arc::clone(&missing),
                check,
            ));
        }
    };

    fan_out(&mut tasks, source.root(), target.root());

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some((source_dir, target_dir))) => fan_out(&mut tasks, source_dir, target_dir),
            Ok(None) => {}
            Err(err) => error!(error = %err, "diff worker failed"),
        }
    }

    let mut result = std::mem::take(&mut *missing.lock().unwrap_or_else(PoisonError::into_inner));
    result.sort_by_name(&source);

    debug!(
        dirs = result.dir_count(),
        entries = result.entry_count(),
        "diff complete"
    );
    result
}

/// Decide whether one source child is contained in its target directory.
///
/// Returns the directory pair to descend into when both sides are
/// directories; that pair counts as contained regardless of its contents.
async fn check_child(
    permits: Arc<tokio::sync::Semaphore>,
    comparator: crate::compare::Comparator,
    source: Arc<Tree>,
    target: Arc<Tree>,
    missing: Arc<Mutex<MissingMap>>,
    check: ChildCheck,
) -> Option<(NodeId, NodeId)> {
    let src_node = source.node(check.source_child);
    let matched = target
        .find_child(check.target_dir, src_node.name())
        .filter(|t| target.node(*t).is_dir() == src_node.is_dir());

    let contained = match matched {
        Some(tgt) if src_node.is_dir() => {
            return Some((check.source_child, tgt));
        }
        Some(tgt) => {
            let Ok(_permit) = permits.acquire_owned().await else {
                warn!("file permit pool closed; treating file as divergent");
                return record(&missing, &target, check);
            };

            let (src_tree, tgt_tree) = (Arc::clone(&source), Arc::clone(&target));
            let src_id = check.source_child;
            let cmp = comparator.clone();
            let compared =
                tokio::task::spawn_blocking(move || cmp.are_equal(src_tree.node(src_id), tgt_tree.node(tgt)));
            match compared.await {
                Ok(Ok(equal)) => equal,
                Ok(Err(err)) => {
                    warn!(path = %src_node.path().display(), error = %err, "comparison failed; scheduling copy");
                    false
                }
                Err(err) => {
                    error!(path = %src_node.path().display(), error = %err, "comparison task failed");
                    false
                }
            }
        }
        None => false,
    };

    if contained {
        None
    } else {
        record(&missing, &target, check)
    }
}

fn record(missing: &Mutex<MissingMap>, target: &Tree, check: ChildCheck) -> Option<(NodeId, NodeId)> {
    let dir = target.node(check.target_dir).path().to_path_buf();
    missing
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(dir, check.source_child);
    None
}
