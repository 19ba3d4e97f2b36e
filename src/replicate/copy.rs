// src/replicate/copy.rs

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::context::SyncContext;
use crate::diff::MissingMap;
use crate::errors::{Result, SyncError};
use crate::tree::{NodeId, Tree};

use super::{CopyReport, Jail};

/// A single file to stream, with both ends already resolved inside their roots.
#[derive(Debug)]
struct FileJob {
    source: PathBuf,
    target: PathBuf,
    permissions: fs::Permissions,
}

/// Create every directory and copy every file in `missing` (node ids of
/// `source`).
///
/// Directories are created up front on a blocking thread, which also yields
/// the list of file jobs. Each file is then copied on its own blocking task
/// holding one permit of the shared semaphore. Returns once every job has
/// finished.
///
/// `target` is the snapshot the diff ran against. A target entry of the
/// other kind is only cleared out of the way if that snapshot tracks it and
/// everything below it.
pub async fn copy_missing(
    ctx: &SyncContext,
    source: &Arc<Tree>,
    target: &Arc<Tree>,
    missing: &MissingMap,
) -> CopyReport {
    let roots: Vec<NodeId> = missing.iter().flat_map(|(_, nodes)| nodes.iter().copied()).collect();
    if roots.is_empty() {
        return CopyReport::default();
    }

    let planner = Planner {
        source_jail: ctx.source_jail().clone(),
        target_jail: ctx.target_jail().clone(),
        tree: Arc::clone(source),
        target: Arc::clone(target),
    };
    let (mut report, jobs) = match tokio::task::spawn_blocking(move || planner.plan(&roots)).await {
        Ok(planned) => planned,
        Err(err) => {
            error!(error = %err, "copy planning task failed");
            return CopyReport {
                failures: missing.entry_count(),
                ..CopyReport::default()
            };
        }
    };

    let mut tasks = JoinSet::new();
    for job in jobs {
        let permit = match Arc::clone(ctx.permits()).acquire_owned().await {
            Ok(p) => p,
            Err(_) => {
                warn!(path = %job.source.display(), "file permit pool closed; skipping copy");
                report.failures += 1;
                continue;
            }
        };

        tasks.spawn_blocking(move || {
            let _permit = permit;
            let outcome = copy_file(&job);
            (job, outcome)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((job, Ok(bytes))) => {
                info!(source = %job.source.display(), target = %job.target.display(), bytes, "copied file");
                report.files_copied += 1;
                report.bytes_copied += bytes;
            }
            Ok((job, Err(err))) => {
                warn!(source = %job.source.display(), target = %job.target.display(), error = %err, "failed to copy file");
                report.failures += 1;
            }
            Err(err) => {
                error!(error = %err, "copy task failed");
                report.failures += 1;
            }
        }
    }

    report
}

struct Planner {
    source_jail: Jail,
    target_jail: Jail,
    tree: Arc<Tree>,
    target: Arc<Tree>,
}

impl Planner {
    fn plan(&self, roots: &[NodeId]) -> (CopyReport, Vec<FileJob>) {
        let mut report = CopyReport::default();
        let mut jobs = Vec::new();
        for &id in roots {
            self.plan_entry(id, &mut report, &mut jobs);
        }
        (report, jobs)
    }

    /// Create `id` if it is a directory and recurse, or queue it if it is a file.
    fn plan_entry(&self, id: NodeId, report: &mut CopyReport, jobs: &mut Vec<FileJob>) {
        let node = self.tree.node(id);
        let rel = self.tree.relative_path(id);

        let (source, target) = match self.resolve_pair(rel) {
            Ok(pair) => pair,
            Err(err @ SyncError::Containment { .. }) => {
                error!(path = %rel.display(), error = %err, "refusing copy outside root");
                report.refused += 1;
                return;
            }
            Err(err) => {
                warn!(path = %rel.display(), error = %err, "cannot resolve copy paths");
                report.failures += 1;
                return;
            }
        };

        if !node.is_dir() {
            if let Err(err) = self.clear_conflict(&target, false) {
                warn!(path = %target.display(), error = %err, "cannot replace directory with file");
                report.failures += 1;
                return;
            }
            jobs.push(FileJob {
                source,
                target,
                permissions: node.permissions().clone(),
            });
            return;
        }

        match self.create_dir(&target) {
            Ok(true) => {
                info!(path = %target.display(), "created directory");
                report.dirs_created += 1;
            }
            Ok(false) => debug!(path = %target.display(), "directory already exists"),
            Err(err) => {
                warn!(path = %target.display(), error = %err, "failed to create directory; skipping subtree");
                report.failures += 1;
                return;
            }
        }

        for &child in node.children() {
            self.plan_entry(child, report, jobs);
        }
    }

    fn resolve_pair(&self, rel: &Path) -> Result<(PathBuf, PathBuf)> {
        Ok((self.source_jail.resolve(rel)?, self.target_jail.resolve(rel)?))
    }

    /// Create `path` as a directory, replacing a tracked file of the same
    /// name. Returns `false` if the directory was already there.
    fn create_dir(&self, path: &Path) -> io::Result<bool> {
        self.clear_conflict(path, true)?;
        match fs::create_dir(path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Remove whatever sits at `path` if its kind differs from the one about
    /// to be written there.
    ///
    /// Only entries in the target snapshot are deleted, deepest first.
    /// Hidden or otherwise untracked content is left alone, in which case
    /// the entry stays and an error is returned.
    fn clear_conflict(&self, path: &Path, want_dir: bool) -> io::Result<()> {
        let meta = match fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err),
        };
        if meta.is_dir() == want_dir {
            return Ok(());
        }

        let Some(id) = self.target.get(path) else {
            return Err(io::Error::other("conflicting entry is not tracked; leaving it in place"));
        };

        info!(path = %path.display(), "removing entry of the other kind");
        for entry in self.target.descendants(id).into_iter().rev() {
            let node = self.target.node(entry);
            let result = if node.is_dir() {
                fs::remove_dir(node.path())
            } else {
                fs::remove_file(node.path())
            };
            match result {
                Ok(()) => debug!(path = %node.path().display(), "removed"),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) if node.is_dir() && err.kind() == io::ErrorKind::DirectoryNotEmpty => {
                    return Err(io::Error::other("directory holds untracked entries; leaving it in place"));
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

/// Stream `job.source` into a temporary file next to `job.target`, apply
/// the source permissions, then rename it over the target.
///
/// The existing target is never opened for writing, so a read-only copy
/// from an earlier pass does not block the update.
fn copy_file(job: &FileJob) -> io::Result<u64> {
    let dir = job
        .target
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "target has no parent directory"))?;

    let mut reader = BufReader::new(File::open(&job.source)?);
    let staged = NamedTempFile::new_in(dir)?;

    let mut writer = BufWriter::new(staged);
    let bytes = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    let staged = writer.into_inner().map_err(|err| err.into_error())?;

    fs::set_permissions(staged.path(), job.permissions.clone())?;
    staged.persist(&job.target).map_err(|err| err.error)?;
    Ok(bytes)
}
