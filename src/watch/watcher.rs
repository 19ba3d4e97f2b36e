// src/watch/watcher.rs

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, WatchRegistrar};
use crate::errors::Result;
use crate::filter::PathFilter;
use crate::watch::event_handler::translate_event;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive and registers further
/// directories with it. Directories are watched one by one, non-recursively,
/// so hidden subtrees never produce events. Dropping every clone of this
/// handle stops file watching.
#[derive(Clone)]
pub struct WatcherHandle {
    inner: Arc<Mutex<RecommendedWatcher>>,
    filter: PathFilter,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish_non_exhaustive()
    }
}

impl WatchRegistrar for WatcherHandle {
    fn watch_tree(&mut self, dir: &Path) -> Result<usize> {
        let mut watcher = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stack = vec![dir.to_path_buf()];
        let mut count = 0;

        while let Some(next) = stack.pop() {
            if let Err(err) = watcher.watch(&next, RecursiveMode::NonRecursive) {
                // The root must be watchable; nested failures only lose that subtree.
                if next == dir {
                    return Err(err.into());
                }
                warn!(path = %next.display(), error = %err, "failed to watch directory");
                continue;
            }
            count += 1;
            stack.extend(approved_subdirs(&next, &self.filter));
        }

        Ok(count)
    }
}

fn approved_subdirs(dir: &Path, filter: &PathFilter) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(path = %dir.display(), error = %err, "cannot list directory for watching");
            return Vec::new();
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .map(|entry| entry.path())
        .filter(|path| filter.is_approved_entry(path, true))
        .collect()
}

/// Spawn a filesystem watcher over every approved directory under `root`
/// and forward typed change events to the runtime.
///
/// - `root` is the canonical source root.
/// - `filter` decides which paths produce events and which directories are watched.
/// - `runtime_tx` is the channel into the main runtime.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    filter: PathFilter,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("mirrorsync: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("mirrorsync: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    let mut handle = WatcherHandle {
        inner: Arc::new(Mutex::new(watcher)),
        filter: filter.clone(),
    };
    let count = handle.watch_tree(&root)?;
    info!(root = %root.display(), directories = count, "file watcher started");

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received notify event");
            for change in translate_event(&root, &filter, &event) {
                if let Err(err) = runtime_tx.send(RuntimeEvent::Change(change)).await {
                    // The runtime is gone; nothing left to deliver to.
                    warn!("failed to send change event: {err}");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(handle)
}
