// src/engine/backend.rs

//! Pluggable seams between the runtime shell and the outside world.
//!
//! The runtime talks to a [`PassBackend`] to run reconciliation passes and
//! to a [`WatchRegistrar`] to extend the watch set. Production wires in
//! [`RealPassBackend`] and the notify-backed
//! [`WatcherHandle`](crate::watch::WatcherHandle); tests swap in recorders.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::SyncContext;
use crate::errors::Result;

use super::PendingBatch;
use super::pass::{PassReport, reconcile};

/// Runs one reconciliation pass.
///
/// The returned future is spawned onto the runtime, so it must own
/// everything it needs.
pub trait PassBackend: Send {
    fn run_pass(
        &mut self,
        batch: PendingBatch,
    ) -> Pin<Box<dyn Future<Output = Result<PassReport>> + Send + 'static>>;
}

/// Extends the set of watched directories when new ones appear.
pub trait WatchRegistrar: Send {
    /// Watch `dir` and every approved directory below it.
    /// Returns the number of directories registered.
    fn watch_tree(&mut self, dir: &Path) -> Result<usize>;
}

/// Real pass backend: snapshot, diff, copy, remove against the live filesystem.
#[derive(Debug, Clone)]
pub struct RealPassBackend {
    ctx: Arc<SyncContext>,
}

impl RealPassBackend {
    pub fn new(ctx: Arc<SyncContext>) -> Self {
        Self { ctx }
    }
}

impl PassBackend for RealPassBackend {
    fn run_pass(
        &mut self,
        batch: PendingBatch,
    ) -> Pin<Box<dyn Future<Output = Result<PassReport>> + Send + 'static>> {
        let ctx = Arc::clone(&self.ctx);
        Box::pin(async move { reconcile(&ctx, &batch).await })
    }
}
