// tests/integration/runtime_debounce.rs

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};

use mirrorsync::engine::{Runtime, RuntimeEvent, RuntimeOptions};
use mirrorsync::types::{ChangeEvent, ChangeKind};

use crate::common::{MirrorFixture, RecordingBackend, RecordingRegistrar, init_tracing};

const QUIET: Duration = Duration::from_secs(30);

fn change(path: impl Into<std::path::PathBuf>, kind: ChangeKind) -> RuntimeEvent {
    RuntimeEvent::Change(ChangeEvent::new(path, kind))
}

struct Harness {
    tx: mpsc::Sender<RuntimeEvent>,
    backend: RecordingBackend,
    registrar: RecordingRegistrar,
    handle: tokio::task::JoinHandle<mirrorsync::errors::Result<()>>,
    start: Instant,
}

impl Harness {
    fn spawn(backend: RecordingBackend) -> Self {
        init_tracing();
        let (tx, rx) = mpsc::channel(64);
        let registrar = RecordingRegistrar::new();
        let runtime = Runtime::new(RuntimeOptions::new(QUIET), rx, backend.clone(), registrar.clone());
        Self {
            tx,
            backend,
            registrar,
            handle: tokio::spawn(runtime.run()),
            start: Instant::now(),
        }
    }

    async fn send(&self, event: RuntimeEvent) {
        self.tx.send(event).await.unwrap();
    }

    async fn shutdown(self) -> Duration {
        self.send(RuntimeEvent::ShutdownRequested).await;
        self.handle.await.unwrap().unwrap();
        self.start.elapsed()
    }
}

#[tokio::test(start_paused = true)]
async fn burst_yields_one_pass_timed_from_the_last_event() {
    let h = Harness::spawn(RecordingBackend::new());

    for i in 0..5 {
        h.send(change(format!("/src/f{i}"), ChangeKind::Write)).await;
        sleep(Duration::from_secs(10)).await;
    }
    // Last event at 40s; quiet period ends at 70s.
    sleep(Duration::from_secs(60)).await;

    let passes = h.backend.passes();
    assert_eq!(passes.len(), 1);
    let fired = passes[0].0 - h.start;
    assert!(
        fired >= Duration::from_secs(70) && fired <= Duration::from_secs(71),
        "pass fired at {fired:?}"
    );
    assert_eq!(passes[0].1.len(), 5);
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn steady_stream_postpones_the_pass() {
    let h = Harness::spawn(RecordingBackend::new());

    for _ in 0..20 {
        h.send(change("/src/busy.log", ChangeKind::Write)).await;
        sleep(Duration::from_secs(20)).await;
    }
    assert_eq!(h.backend.pass_count(), 0);

    sleep(QUIET).await;
    assert_eq!(h.backend.pass_count(), 1);
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn changes_during_a_pass_get_their_own_pass() {
    let h = Harness::spawn(RecordingBackend::new().with_duration(Duration::from_secs(10)));

    h.send(change("/src/a", ChangeKind::Write)).await;
    sleep(QUIET + Duration::from_secs(2)).await;
    assert_eq!(h.backend.pass_count(), 1);

    // Arrives while the first pass is still running.
    h.send(change("/src/b", ChangeKind::Create)).await;
    sleep(QUIET * 2).await;

    let passes = h.backend.passes();
    assert_eq!(passes.len(), 2);
    assert!(passes[1].1.get(std::path::Path::new("/src/b")).is_some());
    assert!(passes[1].1.get(std::path::Path::new("/src/a")).is_none());
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn attribute_only_events_never_trigger_a_pass() {
    let h = Harness::spawn(RecordingBackend::new());
    h.send(change("/src/a", ChangeKind::Other)).await;
    sleep(QUIET * 3).await;
    assert_eq!(h.backend.pass_count(), 0);
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_waits_for_the_running_pass() {
    let h = Harness::spawn(RecordingBackend::new().with_duration(Duration::from_secs(20)));

    h.send(change("/src/a", ChangeKind::Write)).await;
    sleep(QUIET + Duration::from_secs(2)).await;
    assert_eq!(h.backend.pass_count(), 1);

    let elapsed = h.shutdown().await;
    assert!(elapsed >= QUIET + Duration::from_secs(20), "exited after {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn new_directories_are_registered_for_watching() {
    let fx = MirrorFixture::new();
    fx.mkdir_source("fresh").write_source("file.txt", "f");
    let h = Harness::spawn(RecordingBackend::new());

    h.send(change(fx.source().join("fresh"), ChangeKind::Create)).await;
    h.send(change(fx.source().join("file.txt"), ChangeKind::Create)).await;
    sleep(Duration::from_millis(10)).await;

    assert_eq!(h.registrar.dirs(), vec![fx.source().join("fresh")]);
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn closed_channel_stops_the_runtime() {
    let h = Harness::spawn(RecordingBackend::new());
    let Harness { tx, handle, .. } = h;
    drop(tx);
    handle.await.unwrap().unwrap();
}
