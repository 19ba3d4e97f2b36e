// src/watch/mod.rs

//! File watching for the source root.
//!
//! This module is responsible for:
//! - Wiring up a cross-platform filesystem watcher (`notify`), one
//!   non-recursive watch per approved directory.
//! - Translating raw notify events into typed [`ChangeEvent`](crate::types::ChangeEvent)s.
//! - Registering directories that appear after startup when the engine asks.
//!
//! It does **not** decide when to sync; it only reports what changed.

pub mod event_handler;
pub mod path_utils;
pub mod watcher;

pub use event_handler::translate_event;
pub use watcher::{WatcherHandle, spawn_watcher};
