// src/engine/pass.rs

//! One reconciliation pass: snapshot both roots, diff, copy, then remove.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::context::SyncContext;
use crate::diff::{MissingMap, find_missing};
use crate::errors::{Result, SyncError};
use crate::replicate::{CopyReport, RemoveReport, copy_missing, remove_entries};
use crate::tree::{NodeId, Tree, build_constrained_tree, build_tree};

use super::PendingBatch;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    /// Entries the diff found missing or divergent in the target.
    pub missing: usize,
    pub copy: CopyReport,
    /// Set when the capacity guard refused the copy stage.
    pub copy_skipped: bool,
    /// Target entries selected for removal.
    pub removal_planned: usize,
    pub remove: RemoveReport,
    pub elapsed: Duration,
}

impl PassReport {
    /// Whether every planned action succeeded.
    pub fn is_clean(&self) -> bool {
        !self.copy_skipped
            && self.copy.failures == 0
            && self.copy.refused == 0
            && self.remove.failures == 0
            && self.remove.refused == 0
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "missing={} dirs_created={} files_copied={} bytes={} copy_failures={} removed={} remove_failures={} refused={}",
            self.missing,
            self.copy.dirs_created,
            self.copy.files_copied,
            self.copy.bytes_copied,
            self.copy.failures,
            self.remove.removed,
            self.remove.failures,
            self.copy.refused + self.remove.refused,
        )
    }
}

/// Fresh source snapshot, target snapshot constrained to it, and their diff.
pub async fn plan_copy(ctx: &SyncContext) -> Result<(Arc<Tree>, Arc<Tree>, MissingMap)> {
    let source = snapshot_source(ctx).await?;
    let target = snapshot_target(ctx, Some(Arc::clone(&source))).await?;
    let missing = find_missing(ctx, Arc::clone(&source), Arc::clone(&target)).await;
    Ok((source, target, missing))
}

/// Run one full pass for `batch`.
///
/// Fails only when a root cannot be snapshotted; everything else is
/// logged and counted in the report.
pub async fn reconcile(ctx: &SyncContext, batch: &PendingBatch) -> Result<PassReport> {
    let started = Instant::now();
    info!(
        source = %ctx.source_root().display(),
        target = %ctx.target_root().display(),
        changes = batch.len(),
        "reconciliation pass started"
    );

    let mut report = PassReport::default();
    let (source, target, missing) = plan_copy(ctx).await?;
    report.missing = missing.entry_count();

    if !missing.is_empty() {
        let incoming = missing.file_bytes(&source);
        match ctx.capacity().check(ctx.target_root(), incoming) {
            Ok(()) => report.copy = copy_missing(ctx, &source, &target, &missing).await,
            Err(err @ SyncError::CapacityExceeded { .. }) => {
                warn!(error = %err, incoming, "skipping copy");
                report.copy_skipped = true;
            }
            Err(err) => {
                warn!(error = %err, "cannot measure target volume; skipping copy");
                report.copy_skipped = true;
            }
        }
    }

    let candidates: Vec<&Path> = batch.removal_candidates().collect();
    if !candidates.is_empty() {
        let target = snapshot_target(ctx, None).await?;
        let removals = plan_removals(ctx, &source, &target, &candidates);
        report.removal_planned = removals.entry_count();
        if !removals.is_empty() {
            report.remove = remove_entries(ctx, &target, &removals).await;
        }
    }

    report.elapsed = started.elapsed();
    info!(%report, elapsed_ms = report.elapsed.as_millis() as u64, "reconciliation pass finished");
    Ok(report)
}

async fn snapshot_source(ctx: &SyncContext) -> Result<Arc<Tree>> {
    let filter = ctx.filter().clone();
    let root = ctx.source_root().to_path_buf();
    let tree = tokio::task::spawn_blocking(move || build_tree(&root, &filter))
        .await
        .map_err(|e| SyncError::Other(e.into()))??;
    Ok(Arc::new(tree))
}

/// Target snapshot, constrained to `reference` when given. The
/// unconstrained form is used to locate removal candidates.
async fn snapshot_target(ctx: &SyncContext, reference: Option<Arc<Tree>>) -> Result<Arc<Tree>> {
    let filter = ctx.filter().clone();
    let root = ctx.target_root().to_path_buf();
    let tree = tokio::task::spawn_blocking(move || match reference {
        Some(reference) => build_constrained_tree(&reference, &root, &filter),
        None => build_tree(&root, &filter),
    })
    .await
    .map_err(|e| SyncError::Other(e.into()))??;
    Ok(Arc::new(tree))
}

/// Map removal candidates (source paths) to target nodes, grouped by their
/// target parent directory.
///
/// A candidate qualifies only if it is absent from the fresh source
/// snapshot and from disk, is not hidden, and the target tracks it. Entries
/// below another qualifying entry are dropped since removing the ancestor
/// covers them.
pub fn plan_removals(ctx: &SyncContext, source: &Tree, target: &Tree, candidates: &[&Path]) -> MissingMap {
    let mut selected = BTreeSet::new();

    for &path in candidates {
        let Ok(rel) = ctx.source_jail().relative(path) else {
            debug!(path = %path.display(), "removal candidate outside source root");
            continue;
        };
        if rel.as_os_str().is_empty() || !ctx.filter().is_approved_name(path) {
            continue;
        }
        if source.contains(path) || path.symlink_metadata().is_ok() {
            debug!(path = %path.display(), "removal candidate still present in source");
            continue;
        }
        if let Some(id) = target.get(&target.root_path().join(rel)) {
            selected.insert(id);
        }
    }

    let mut removals = MissingMap::new();
    for &id in &selected {
        if has_selected_ancestor(target, id, &selected) {
            continue;
        }
        if let Some(parent) = target.node(id).parent() {
            removals.insert(target.node(parent).path(), id);
        }
    }
    removals
}

fn has_selected_ancestor(tree: &Tree, id: NodeId, selected: &BTreeSet<NodeId>) -> bool {
    let mut current = tree.node(id).parent();
    while let Some(parent) = current {
        if selected.contains(&parent) {
            return true;
        }
        current = tree.node(parent).parent();
    }
    false
}
