// src/watch/event_handler.rs

//! Turning raw notify events into typed [`ChangeEvent`]s.

use std::path::Path;

use notify::Event;
use tracing::{debug, trace};

use crate::filter::PathFilter;
use crate::types::{ChangeEvent, ChangeKind};
use crate::watch::path_utils::normalize_event_path;

/// Translate one notify event into change events for the engine.
///
/// Unclassified kinds, paths outside `root` and paths the filter rejects
/// are dropped. Paths that may be gone (removals, renames) are checked by
/// name only; others are stat'ed so the extension allow-list applies.
pub fn translate_event(root: &Path, filter: &PathFilter, event: &Event) -> Vec<ChangeEvent> {
    let kind = ChangeKind::from(&event.kind);
    if kind == ChangeKind::Other {
        trace!(kind = ?event.kind, "ignoring event kind");
        return Vec::new();
    }

    event
        .paths
        .iter()
        .filter_map(|raw| {
            let Some(path) = normalize_event_path(root, raw) else {
                debug!(path = %raw.display(), root = %root.display(), "event outside source root");
                return None;
            };

            let approved = if kind.is_removal() {
                filter.is_approved_name(&path)
            } else {
                filter.is_approved(&path)
            };
            approved.then(|| ChangeEvent::new(path, kind))
        })
        .collect()
}
