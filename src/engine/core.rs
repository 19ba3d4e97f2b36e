// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels and driving the interval timer
//! - registering watches and running passes
//! - handling Ctrl+C / shutdown
//!
//! Time is passed in explicitly, so the core is tested without any Tokio,
//! channels or filesystem.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info};

use crate::types::ChangeKind;

use super::{PendingBatch, RuntimeEvent, RuntimeOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Nothing pending.
    Idle,
    /// Changes recorded, waiting for the quiet period to elapse.
    Accumulating,
    /// A pass is running; new changes are held for the next one.
    Syncing,
}

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Start watching this path and every directory below it, if it is a directory.
    WatchTree(PathBuf),
    /// Start a reconciliation pass for these changes.
    RunPass(PendingBatch),
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

#[derive(Debug)]
pub struct CoreRuntime {
    options: RuntimeOptions,
    state: SyncState,
    pending: PendingBatch,
    last_event: Option<Instant>,
}

impl CoreRuntime {
    pub fn new(options: RuntimeOptions) -> Self {
        Self {
            options,
            state: SyncState::Idle,
            pending: PendingBatch::new(),
            last_event: None,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Changes recorded since the last pass started (for tests).
    pub fn pending(&self) -> &PendingBatch {
        &self.pending
    }

    /// Handle a single runtime event observed at `now`.
    pub fn step(&mut self, event: RuntimeEvent, now: Instant) -> CoreStep {
        match event {
            RuntimeEvent::Change(change) => {
                if change.kind == ChangeKind::Other {
                    return CoreStep::continue_with(Vec::new());
                }

                // A directory can appear under a new name through either kind.
                let mut commands = Vec::new();
                if matches!(change.kind, ChangeKind::Create | ChangeKind::Rename) {
                    commands.push(CoreCommand::WatchTree(change.path.clone()));
                }

                self.pending.record(change.path, change.kind);
                self.last_event = Some(now);
                if self.state == SyncState::Idle {
                    self.state = SyncState::Accumulating;
                }
                CoreStep::continue_with(commands)
            }
            RuntimeEvent::Tick => CoreStep::continue_with(self.on_tick(now)),
            RuntimeEvent::PassCompleted => {
                self.state = if self.pending.is_empty() {
                    SyncState::Idle
                } else {
                    SyncState::Accumulating
                };
                debug!(state = ?self.state, pending = self.pending.len(), "pass completed");
                CoreStep::continue_with(Vec::new())
            }
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }

    fn on_tick(&mut self, now: Instant) -> Vec<CoreCommand> {
        if self.state != SyncState::Accumulating {
            return Vec::new();
        }
        let Some(last) = self.last_event else {
            return Vec::new();
        };
        if now.saturating_duration_since(last) < self.options.quiet_period {
            return Vec::new();
        }

        let batch = std::mem::take(&mut self.pending);
        self.last_event = None;
        self.state = SyncState::Syncing;
        info!(changes = batch.len(), "quiet period elapsed; starting pass");
        vec![CoreCommand::RunPass(batch)]
    }
}
