// src/context.rs

//! Shared, read-only state for every reconciliation pass.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::capacity::CapacityGuard;
use crate::compare::Comparator;
use crate::config::Config;
use crate::errors::Result;
use crate::filter::PathFilter;
use crate::replicate::Jail;

/// Built once from [`Config`] at startup and handed by reference (or `Arc`)
/// to the snapshot builder, diff, replication and runtime.
///
/// The semaphore bounds open file handles across comparison and copy.
#[derive(Debug)]
pub struct SyncContext {
    source: Jail,
    target: Jail,
    filter: PathFilter,
    comparator: Comparator,
    permits: Arc<Semaphore>,
    capacity: CapacityGuard,
}

impl SyncContext {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self {
            source: Jail::new(&cfg.source_dir)?,
            target: Jail::new(&cfg.target_dir)?,
            filter: PathFilter::new(&cfg.approved_extensions)?,
            comparator: Comparator::default(),
            permits: Arc::new(Semaphore::new(cfg.max_open_files)),
            capacity: CapacityGuard::new(cfg.max_fill),
        })
    }

    /// Replace the comparator (e.g. one reading through a mock filesystem).
    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn source_root(&self) -> &Path {
        self.source.root()
    }

    pub fn target_root(&self) -> &Path {
        self.target.root()
    }

    pub fn source_jail(&self) -> &Jail {
        &self.source
    }

    pub fn target_jail(&self) -> &Jail {
        &self.target
    }

    pub fn filter(&self) -> &PathFilter {
        &self.filter
    }

    pub fn comparator(&self) -> &Comparator {
        &self.comparator
    }

    pub fn permits(&self) -> &Arc<Semaphore> {
        &self.permits
    }

    pub fn capacity(&self) -> &CapacityGuard {
        &self.capacity
    }
}
