#![allow(dead_code)]

pub use mirrorsync_test_utils::fixture::list_entries;
pub use mirrorsync_test_utils::{MirrorFixture, RecordingBackend, RecordingRegistrar, init_tracing, with_timeout};

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use mirrorsync::context::SyncContext;
use mirrorsync::diff::{MissingMap, find_missing};
use mirrorsync::tree::{Tree, build_constrained_tree, build_tree};

/// Snapshot both roots of `ctx` (target constrained to source) and diff them.
pub async fn diff_roots(ctx: &SyncContext) -> (Arc<Tree>, Arc<Tree>, MissingMap) {
    let source = Arc::new(build_tree(ctx.source_root(), ctx.filter()).expect("source snapshot"));
    let target = Arc::new(
        build_constrained_tree(&source, ctx.target_root(), ctx.filter()).expect("target snapshot"),
    );
    let missing = find_missing(ctx, Arc::clone(&source), Arc::clone(&target)).await;
    (source, target, missing)
}

/// Missing-Map rendered as target dir → entry names.
pub fn names(missing: &MissingMap, source: &Tree) -> BTreeMap<PathBuf, Vec<String>> {
    missing.describe(source)
}
