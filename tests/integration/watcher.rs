// tests/integration/watcher.rs

use std::fs;
use std::path::Path;

use tokio::sync::mpsc;

use mirrorsync::engine::{RuntimeEvent, WatchRegistrar};
use mirrorsync::filter::PathFilter;
use mirrorsync::watch::spawn_watcher;

use crate::common::{MirrorFixture, init_tracing, with_timeout};

/// Wait until an event for `path` arrives, skipping unrelated ones.
async fn wait_for_path(rx: &mut mpsc::Receiver<RuntimeEvent>, path: &Path) {
    with_timeout(async {
        while let Some(event) = rx.recv().await {
            if let RuntimeEvent::Change(change) = event {
                if change.path == path {
                    return;
                }
            }
        }
        panic!("watcher channel closed");
    })
    .await
}

#[tokio::test]
async fn file_changes_reach_the_runtime_channel() {
    init_tracing();
    let fx = MirrorFixture::new();
    let (tx, mut rx) = mpsc::channel(256);
    let _handle = spawn_watcher(fx.source(), PathFilter::default(), tx).unwrap();

    fx.write_source("hello.txt", "hi");
    wait_for_path(&mut rx, &fx.source().join("hello.txt")).await;
}

#[tokio::test]
async fn directories_registered_later_are_watched() {
    let fx = MirrorFixture::new();
    let (tx, mut rx) = mpsc::channel(256);
    let mut handle = spawn_watcher(fx.source(), PathFilter::default(), tx).unwrap();

    fs::create_dir_all(fx.source().join("new/nested")).unwrap();
    wait_for_path(&mut rx, &fx.source().join("new")).await;

    let count = handle.watch_tree(&fx.source().join("new")).unwrap();
    assert_eq!(count, 2);

    fx.write_source("new/nested/inner.txt", "x");
    wait_for_path(&mut rx, &fx.source().join("new/nested/inner.txt")).await;
}
