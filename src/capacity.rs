// src/capacity.rs

//! Target volume fill limit.

use std::path::Path;

use tracing::debug;

use crate::errors::{Result, SyncError};

/// Refuses writes that would push the target volume past `max_fill`.
#[derive(Debug, Clone, Copy)]
pub struct CapacityGuard {
    max_fill: f64,
}

impl CapacityGuard {
    pub fn new(max_fill: f64) -> Self {
        Self { max_fill }
    }

    pub fn max_fill(&self) -> f64 {
        self.max_fill
    }

    /// Current fill ratio of the volume holding `root`.
    pub fn current_fill(&self, root: &Path) -> Result<f64> {
        let total = fs2::total_space(root)?;
        let available = fs2::available_space(root)?;
        Ok(projected_fill(total, available, 0))
    }

    /// Check that writing `incoming` more bytes under `root` stays within the limit.
    pub fn check(&self, root: &Path, incoming: u64) -> Result<()> {
        let total = fs2::total_space(root)?;
        let available = fs2::available_space(root)?;
        let projected = projected_fill(total, available, incoming);

        debug!(
            root = %root.display(),
            total,
            available,
            incoming,
            projected,
            limit = self.max_fill,
            "capacity check"
        );

        if projected > self.max_fill {
            return Err(SyncError::CapacityExceeded {
                projected,
                limit: self.max_fill,
            });
        }
        Ok(())
    }
}

/// Fill ratio after writing `incoming` bytes to a volume of `total` bytes
/// with `available` bytes free. A zero-sized volume counts as full.
pub fn projected_fill(total: u64, available: u64, incoming: u64) -> f64 {
    if total == 0 {
        return 1.0;
    }
    let used = total.saturating_sub(available);
    used.saturating_add(incoming) as f64 / total as f64
}
