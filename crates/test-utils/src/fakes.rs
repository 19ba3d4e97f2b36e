use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use mirrorsync::engine::{PassBackend, PassReport, PendingBatch, WatchRegistrar};
use mirrorsync::errors::Result;

/// A fake pass backend that:
/// - records every batch it was asked to sync, with the (tokio) time it started
/// - "runs" for `duration`, then reports an empty pass.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    passes: Arc<Mutex<Vec<(Instant, PendingBatch)>>>,
    duration: Duration,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn passes(&self) -> Vec<(Instant, PendingBatch)> {
        self.passes.lock().unwrap().clone()
    }

    pub fn pass_count(&self) -> usize {
        self.passes.lock().unwrap().len()
    }
}

impl PassBackend for RecordingBackend {
    fn run_pass(
        &mut self,
        batch: PendingBatch,
    ) -> Pin<Box<dyn Future<Output = Result<PassReport>> + Send + 'static>> {
        let passes = Arc::clone(&self.passes);
        let duration = self.duration;

        Box::pin(async move {
            passes.lock().unwrap().push((Instant::now(), batch));
            if !duration.is_zero() {
                tokio::time::sleep(duration).await;
            }
            Ok(PassReport::default())
        })
    }
}

/// Records directories the runtime asked to watch.
#[derive(Clone, Default)]
pub struct RecordingRegistrar {
    dirs: Arc<Mutex<Vec<PathBuf>>>,
}

impl RecordingRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dirs(&self) -> Vec<PathBuf> {
        self.dirs.lock().unwrap().clone()
    }
}

impl WatchRegistrar for RecordingRegistrar {
    fn watch_tree(&mut self, dir: &Path) -> Result<usize> {
        self.dirs.lock().unwrap().push(dir.to_path_buf());
        Ok(1)
    }
}
