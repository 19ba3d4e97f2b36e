// tests/integration/containment.rs

use std::fs;
use std::path::Path;
use std::sync::Arc;

use mirrorsync::diff::MissingMap;
use mirrorsync::errors::SyncError;
use mirrorsync::filter::PathFilter;
use mirrorsync::replicate::{Jail, remove_entries};
use mirrorsync::tree::build_tree;

use crate::common::{MirrorFixture, list_entries};

#[test]
fn traversal_out_of_the_target_is_refused() {
    let fx = MirrorFixture::new();
    let jail = Jail::new(fx.target()).unwrap();

    for rel in ["../src/file.txt", "a/../../src", "/tmp/evil"] {
        assert!(
            matches!(jail.resolve(Path::new(rel)), Err(SyncError::Containment { .. })),
            "{rel} escaped"
        );
    }
}

#[tokio::test]
async fn removing_nodes_outside_the_target_root_touches_nothing() {
    let fx = MirrorFixture::new();
    fx.write_source("precious/data.txt", "keep me")
        .write_source("other.txt", "keep me too");
    let ctx = fx.context();

    // A tree of the *source* root handed to the target-side remover.
    let foreign = Arc::new(build_tree(fx.source(), &PathFilter::default()).unwrap());
    let mut removals = MissingMap::new();
    for &child in foreign.node(foreign.root()).children() {
        removals.insert(foreign.root_path(), child);
    }

    let before = list_entries(fx.source());
    let report = remove_entries(&ctx, &foreign, &removals).await;

    assert_eq!(report.refused, 2);
    assert_eq!(report.removed, 0);
    assert_eq!(list_entries(fx.source()), before);
}

#[cfg(unix)]
#[tokio::test]
async fn copy_through_a_symlinked_target_dir_is_refused() {
    use mirrorsync::replicate::copy_missing;

    let fx = MirrorFixture::new();
    let outside = tempfile::tempdir().unwrap();
    fx.write_source("media/new.mkv", "payload");
    std::os::unix::fs::symlink(outside.path(), fx.target().join("media")).unwrap();
    let ctx = fx.context();

    // The symlink is not tracked, so the diff asks for `media` to be created.
    let (source, target, missing) = crate::common::diff_roots(&ctx).await;
    let report = copy_missing(&ctx, &source, &target, &missing).await;

    assert_eq!(report.files_copied, 0);
    assert!(report.refused + report.failures >= 1);
    assert!(fs::read_dir(outside.path()).unwrap().next().is_none());
}
