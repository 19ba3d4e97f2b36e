// src/replicate/mod.rs

//! Applying a [`MissingMap`](crate::diff::MissingMap) to the filesystem.
//!
//! - [`copy`] creates missing directories and streams missing or divergent
//!   files from source to target.
//! - [`remove`] deletes target entries that no longer exist in the source.
//!
//! Both resolve every path through a [`Jail`] and treat failures as local
//! to the entry: they are logged, counted and skipped.

pub mod copy;
pub mod jail;
pub mod remove;

pub use copy::copy_missing;
pub use jail::Jail;
pub use remove::remove_entries;

/// Outcome of one copy pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub dirs_created: usize,
    pub files_copied: usize,
    pub bytes_copied: u64,
    pub failures: usize,
    /// Entries whose resolved path would leave a root.
    pub refused: usize,
}

/// Outcome of one removal pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveReport {
    pub removed: usize,
    pub failures: usize,
    pub refused: usize,
}
