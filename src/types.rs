// src/types.rs

use std::path::PathBuf;
use std::str::FromStr;

/// Kind of filesystem change reported by the watch adapter.
///
/// Only the most recent kind per path survives a debounce window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Create,
    Write,
    Remove,
    Rename,
    /// Attribute-only or unclassified changes; ignored by the engine.
    Other,
}

impl ChangeKind {
    /// Whether this change may mean the path left the source tree.
    pub fn is_removal(self) -> bool {
        matches!(self, ChangeKind::Remove | ChangeKind::Rename)
    }
}

impl From<&notify::EventKind> for ChangeKind {
    fn from(kind: &notify::EventKind) -> Self {
        use notify::event::{EventKind, ModifyKind};

        match kind {
            EventKind::Create(_) => ChangeKind::Create,
            EventKind::Remove(_) => ChangeKind::Remove,
            EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Rename,
            EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
                ChangeKind::Write
            }
            _ => ChangeKind::Other,
        }
    }
}

/// A single typed change event flowing from the watcher into the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Log level accepted in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for ConfigLogLevel {
    fn default() -> Self {
        ConfigLogLevel::Info
    }
}

impl FromStr for ConfigLogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(ConfigLogLevel::Error),
            "warn" | "warning" => Ok(ConfigLogLevel::Warn),
            "info" => Ok(ConfigLogLevel::Info),
            "debug" => Ok(ConfigLogLevel::Debug),
            "trace" => Ok(ConfigLogLevel::Trace),
            other => Err(format!(
                "invalid log_level: {other} (expected error, warn, info, debug or trace)"
            )),
        }
    }
}

impl From<ConfigLogLevel> for tracing::Level {
    fn from(level: ConfigLogLevel) -> Self {
        match level {
            ConfigLogLevel::Error => tracing::Level::ERROR,
            ConfigLogLevel::Warn => tracing::Level::WARN,
            ConfigLogLevel::Info => tracing::Level::INFO,
            ConfigLogLevel::Debug => tracing::Level::DEBUG,
            ConfigLogLevel::Trace => tracing::Level::TRACE,
        }
    }
}
