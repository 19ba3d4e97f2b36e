// src/replicate/remove.rs

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::context::SyncContext;
use crate::diff::MissingMap;
use crate::errors::Result;
use crate::tree::{NodeId, Tree};

use super::{Jail, RemoveReport};

#[derive(Debug)]
enum Outcome {
    Removed,
    /// The entry is still on disk after deletion (e.g. it holds untracked files).
    Remaining,
    Refused,
    Failed,
}

/// Delete every entry in `removals` (node ids of `target`) from disk.
///
/// Each entry is removed on its own blocking task: tracked descendants go
/// first, deepest first, then the entry itself. Anything the snapshot did
/// not track (hidden files, symlinks) is left alone, so a directory holding
/// such entries survives. Every entry is checked for existence afterwards.
pub async fn remove_entries(ctx: &SyncContext, target: &Arc<Tree>, removals: &MissingMap) -> RemoveReport {
    let mut report = RemoveReport::default();
    let mut tasks = JoinSet::new();

    for id in removals.iter().flat_map(|(_, nodes)| nodes.iter().copied()) {
        let jail = ctx.target_jail().clone();
        let tree = Arc::clone(target);
        tasks.spawn_blocking(move || remove_node(&jail, &tree, id));
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Outcome::Removed) => report.removed += 1,
            Ok(Outcome::Refused) => report.refused += 1,
            Ok(Outcome::Remaining | Outcome::Failed) => report.failures += 1,
            Err(err) => {
                error!(error = %err, "removal task failed");
                report.failures += 1;
            }
        }
    }

    report
}

fn remove_node(jail: &Jail, tree: &Tree, id: NodeId) -> Outcome {
    let top = match resolve(jail, tree, id) {
        Ok(path) => path,
        Err(err) => {
            error!(path = %tree.node(id).path().display(), error = %err, "refusing removal outside root");
            return Outcome::Refused;
        }
    };

    // Deepest entries first so directories are empty by the time we reach them.
    for child in tree.descendants(id).into_iter().rev() {
        let path = match resolve(jail, tree, child) {
            Ok(path) => path,
            Err(err) => {
                error!(path = %tree.node(child).path().display(), error = %err, "refusing removal outside root");
                continue;
            }
        };

        let result = if tree.node(child).is_dir() {
            fs::remove_dir(&path)
        } else {
            fs::remove_file(&path)
        };

        match result {
            Ok(()) => info!(path = %path.display(), "removed"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %path.display(), error = %err, "failed to remove"),
        }
    }

    match fs::symlink_metadata(&top) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Outcome::Removed,
        Ok(_) => {
            warn!(path = %top.display(), "entry still present after removal");
            Outcome::Remaining
        }
        Err(err) => {
            warn!(path = %top.display(), error = %err, "cannot verify removal");
            Outcome::Failed
        }
    }
}

fn resolve(jail: &Jail, tree: &Tree, id: NodeId) -> Result<PathBuf> {
    let rel = jail.relative(tree.node(id).path())?;
    jail.resolve(rel)
}
