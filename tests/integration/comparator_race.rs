// tests/integration/comparator_race.rs

use std::path::Path;
use std::sync::Arc;

use mirrorsync::compare::Comparator;
use mirrorsync::errors::SyncError;
use mirrorsync::fs::mock::MockFileSystem;

use crate::common::{MirrorFixture, diff_roots, init_tracing};

#[test]
fn changing_file_is_reported_unresolved_not_equal() {
    init_tracing();
    let mock = MockFileSystem::new();
    mock.add_file("/src/movie.mkv", b"identical bytes".to_vec());
    mock.add_file("/dst/movie.mkv", b"identical bytes".to_vec());
    mock.keep_modifying("/dst/movie.mkv");

    let cmp = Comparator::new(Arc::new(mock.clone()));
    let result = cmp.compare_files(Path::new("/src/movie.mkv"), Path::new("/dst/movie.mkv"));

    match result {
        Err(SyncError::CompareUnresolved { attempts, .. }) => assert_eq!(attempts, 2),
        other => panic!("expected unresolved comparison, got {other:?}"),
    }
    // One initial stat plus one re-stat per attempt.
    assert_eq!(mock.stat_count("/dst/movie.mkv"), 3);
}

#[test]
fn extra_attempts_are_honoured() {
    let mock = MockFileSystem::new();
    mock.add_file("/a", b"x".to_vec());
    mock.add_file("/b", b"x".to_vec());
    mock.keep_modifying("/a");

    let cmp = Comparator::new(Arc::new(mock)).with_attempts(5);
    assert!(matches!(
        cmp.compare_files(Path::new("/a"), Path::new("/b")),
        Err(SyncError::CompareUnresolved { attempts: 5, .. })
    ));
}

#[test]
fn stable_files_compare_equal_through_the_seam() {
    let mock = MockFileSystem::new();
    mock.add_file("/a", vec![3u8; 10_000]);
    mock.add_file("/b", vec![3u8; 10_000]);

    let cmp = Comparator::new(Arc::new(mock)).with_chunk_size(4096);
    assert!(cmp.compare_files(Path::new("/a"), Path::new("/b")).unwrap());
}

#[tokio::test]
async fn unresolved_comparison_schedules_a_copy() {
    let fx = MirrorFixture::new();
    fx.write_source("live.log", "same").write_target("live.log", "same");

    let mock = MockFileSystem::new();
    mock.add_file(fx.source().join("live.log"), b"same".to_vec());
    mock.add_file(fx.target().join("live.log"), b"same".to_vec());
    mock.keep_modifying(fx.source().join("live.log"));

    let ctx = fx.context().with_comparator(Comparator::new(Arc::new(mock)));
    let (_, _, missing) = diff_roots(&ctx).await;
    assert_eq!(missing.entry_count(), 1);
    assert!(missing.get(fx.target()).is_some());
}
