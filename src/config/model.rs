// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::ConfigLogLevel;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// source_dir = "/srv/media"
/// target_dir = "/mnt/backup/media"
/// max_fill = 0.92
/// sync_delay = "30s"
/// max_open_files = 64
/// approved_extensions = ["mkv", "mp4", "srt"]
/// ```
///
/// Everything except the two roots has a default.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    /// Directory being mirrored.
    #[serde(default)]
    pub source_dir: String,

    /// Directory kept identical to `source_dir`.
    #[serde(default)]
    pub target_dir: String,

    /// Maximum fraction of the target volume our writes may fill.
    #[serde(default = "default_max_fill")]
    pub max_fill: f64,

    /// `"error"`, `"warn"`, `"info"`, `"debug"` or `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Quiet period before a reconciliation pass, e.g. `"30s"`, `"5m"`, `"1h"`.
    #[serde(default = "default_sync_delay")]
    pub sync_delay: String,

    /// Upper bound on concurrently open file handles.
    #[serde(default = "default_max_open_files")]
    pub max_open_files: usize,

    /// If non-empty, only regular files with one of these extensions are
    /// tracked. A leading dot is optional; matching ignores case.
    #[serde(default)]
    pub approved_extensions: Vec<String>,

    /// Append logs to this file instead of stderr.
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Run one reconciliation pass at startup, before watching.
    #[serde(default = "default_initial_sync")]
    pub initial_sync: bool,
}

fn default_max_fill() -> f64 {
    0.92
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sync_delay() -> String {
    "30s".to_string()
}

fn default_max_open_files() -> usize {
    64
}

fn default_initial_sync() -> bool {
    true
}

impl RawConfig {
    /// A raw config with only the roots set; every other field takes its default.
    pub fn with_roots(source_dir: impl Into<String>, target_dir: impl Into<String>) -> Self {
        Self {
            source_dir: source_dir.into(),
            target_dir: target_dir.into(),
            max_fill: default_max_fill(),
            log_level: default_log_level(),
            sync_delay: default_sync_delay(),
            max_open_files: default_max_open_files(),
            approved_extensions: Vec::new(),
            log_file: None,
            initial_sync: default_initial_sync(),
        }
    }
}

/// Validated configuration.
///
/// Only obtainable through `Config::try_from(RawConfig)`, so the roots are
/// known to be existing, canonical, disjoint directories.
#[derive(Debug, Clone)]
pub struct Config {
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    pub max_fill: f64,
    pub log_level: ConfigLogLevel,
    pub sync_delay: Duration,
    pub max_open_files: usize,
    /// Lowercased, without leading dots.
    pub approved_extensions: Vec<String>,
    pub log_file: Option<PathBuf>,
    pub initial_sync: bool,
}
