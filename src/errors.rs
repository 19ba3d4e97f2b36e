// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Watcher error: {0}")]
    WatchError(#[from] notify::Error),

    /// The directory a snapshot was requested for cannot be opened or listed.
    #[error("snapshot root {path:?} is unreachable: {source}")]
    RootUnreachable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Content comparison kept observing metadata changes across retries.
    #[error("changes detected while comparing {source_path:?} with {target_path:?} ({attempts} attempts)")]
    CompareUnresolved {
        source_path: PathBuf,
        target_path: PathBuf,
        attempts: u32,
    },

    /// A computed path would resolve outside its jailed root.
    #[error("path {path:?} escapes root {root:?}")]
    Containment { path: PathBuf, root: PathBuf },

    #[error("target volume would reach {projected:.3} fill (limit {limit:.3})")]
    CapacityExceeded { projected: f64, limit: f64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SyncError>;
