// src/engine/mod.rs

//! Debounce orchestration for mirrorsync.
//!
//! This module ties together:
//! - the pending change set and quiet-period decision
//! - the reconciliation pass (snapshot, diff, copy, remove)
//! - the main runtime loop that reacts to:
//!   - change events from the watcher
//!   - interval ticks
//!   - pass completion
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::{ChangeEvent, ChangeKind};

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Minimum time without new events before a pass may start.
    pub quiet_period: Duration,
    /// How often the shell checks whether the quiet period has elapsed.
    pub tick: Duration,
}

impl RuntimeOptions {
    /// Options for `quiet_period`, ticking at a quarter of it (10ms..=1s).
    pub fn new(quiet_period: Duration) -> Self {
        let tick = (quiet_period / 4).clamp(Duration::from_millis(10), Duration::from_secs(1));
        Self { quiet_period, tick }
    }
}

/// Events flowing into the runtime from the watcher, the shell itself, etc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// A filesystem change under the source root.
    Change(ChangeEvent),
    /// Interval timer fired.
    Tick,
    /// The pass started by the last `RunPass` command has finished.
    PassCompleted,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Changes accumulated during one debounce window, latest kind per path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingBatch {
    changes: BTreeMap<PathBuf, ChangeKind>,
}

impl PendingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `kind` for `path`, replacing any earlier kind.
    pub fn record(&mut self, path: PathBuf, kind: ChangeKind) {
        self.changes.insert(path, kind);
    }

    pub fn get(&self, path: &Path) -> Option<ChangeKind> {
        self.changes.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, ChangeKind)> {
        self.changes.iter().map(|(p, k)| (p.as_path(), *k))
    }

    /// Paths whose latest change may mean they left the source.
    pub fn removal_candidates(&self) -> impl Iterator<Item = &Path> {
        self.iter()
            .filter(|(_, kind)| kind.is_removal())
            .map(|(path, _)| path)
    }
}

impl FromIterator<ChangeEvent> for PendingBatch {
    fn from_iter<I: IntoIterator<Item = ChangeEvent>>(iter: I) -> Self {
        let mut batch = PendingBatch::new();
        for event in iter {
            batch.record(event.path, event.kind);
        }
        batch
    }
}

pub mod backend;
pub mod core;
pub mod pass;
pub mod runtime;

pub use backend::{PassBackend, RealPassBackend, WatchRegistrar};
pub use core::{CoreCommand, CoreRuntime, CoreStep, SyncState};
pub use pass::{PassReport, reconcile};
pub use runtime::Runtime;
