// tests/integration/removal.rs

use std::fs;

use mirrorsync::engine::{PendingBatch, reconcile};
use mirrorsync::types::{ChangeEvent, ChangeKind};

use crate::common::{MirrorFixture, init_tracing};

fn batch(events: &[(std::path::PathBuf, ChangeKind)]) -> PendingBatch {
    events
        .iter()
        .map(|(path, kind)| ChangeEvent::new(path.clone(), *kind))
        .collect()
}

#[tokio::test]
async fn removed_source_file_is_removed_from_target() {
    init_tracing();
    let fx = MirrorFixture::new();
    fx.write_source("keep.txt", "k")
        .write_target("keep.txt", "k")
        .write_target("gone.txt", "g");
    let ctx = fx.context();

    let report = reconcile(&ctx, &batch(&[(fx.source().join("gone.txt"), ChangeKind::Remove)]))
        .await
        .unwrap();

    assert_eq!(report.removal_planned, 1);
    assert_eq!(report.remove.removed, 1);
    assert!(fx.read_target("gone.txt").is_none());
    assert!(fx.read_target("keep.txt").is_some());
}

#[tokio::test]
async fn removed_directory_is_removed_recursively() {
    let fx = MirrorFixture::new();
    fx.write_target("season/e01.mkv", "1")
        .write_target("season/extras/bts.mkv", "2");
    let ctx = fx.context();

    let report = reconcile(
        &ctx,
        &batch(&[
            (fx.source().join("season"), ChangeKind::Remove),
            (fx.source().join("season/e01.mkv"), ChangeKind::Remove),
        ]),
    )
    .await
    .unwrap();

    // The nested candidate is covered by its parent.
    assert_eq!(report.removal_planned, 1);
    assert_eq!(report.remove.removed, 1);
    assert!(fx.target_entries().is_empty());
}

#[tokio::test]
async fn paths_still_in_source_are_kept() {
    let fx = MirrorFixture::new();
    fx.write_source("back.txt", "b").write_target("back.txt", "b");
    let ctx = fx.context();

    // Removed and re-created within one window.
    let report = reconcile(&ctx, &batch(&[(fx.source().join("back.txt"), ChangeKind::Remove)]))
        .await
        .unwrap();

    assert_eq!(report.removal_planned, 0);
    assert!(fx.read_target("back.txt").is_some());
}

#[tokio::test]
async fn rename_removes_old_name_and_copies_new_one() {
    let fx = MirrorFixture::new();
    fx.write_source("new-name.txt", "content")
        .write_target("old-name.txt", "content");
    let ctx = fx.context();

    let report = reconcile(
        &ctx,
        &batch(&[
            (fx.source().join("old-name.txt"), ChangeKind::Rename),
            (fx.source().join("new-name.txt"), ChangeKind::Rename),
        ]),
    )
    .await
    .unwrap();

    assert_eq!(report.copy.files_copied, 1);
    assert_eq!(report.remove.removed, 1);
    assert_eq!(fx.target_entries(), fx.source_entries());
}

#[cfg(not(windows))]
#[tokio::test]
async fn hidden_contents_survive_directory_removal() {
    let fx = MirrorFixture::new();
    fx.write_target("album/track.flac", "t")
        .write_target("album/.thumbs", "private");
    let ctx = fx.context();

    let report = reconcile(&ctx, &batch(&[(fx.source().join("album"), ChangeKind::Remove)]))
        .await
        .unwrap();

    assert!(fx.read_target("album/track.flac").is_none());
    assert_eq!(fs::read(fx.target().join("album/.thumbs")).unwrap(), b"private");
    // The directory could not go away, which is reported.
    assert_eq!(report.remove.failures, 1);
}

#[cfg(not(windows))]
#[tokio::test]
async fn hidden_removal_candidates_are_ignored() {
    let fx = MirrorFixture::new();
    fx.write_target(".DS_Store", "x");
    let ctx = fx.context();

    let report = reconcile(&ctx, &batch(&[(fx.source().join(".DS_Store"), ChangeKind::Remove)]))
        .await
        .unwrap();

    assert_eq!(report.removal_planned, 0);
    assert!(fx.read_target(".DS_Store").is_some());
}
