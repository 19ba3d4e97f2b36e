// src/engine/runtime.rs

use std::fmt;
use std::path::Path;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::errors::Result;

use super::backend::{PassBackend, WatchRegistrar};
use super::core::CoreRuntime;
use super::pass::PassReport;
use super::{CoreCommand, PendingBatch, RuntimeEvent, RuntimeOptions};

type PassHandle = JoinHandle<Result<PassReport>>;

/// What woke the loop up.
enum Wake {
    Event(Option<RuntimeEvent>),
    Tick,
    PassDone(std::result::Result<Result<PassReport>, JoinError>),
}

/// Drives the debounce core in response to `RuntimeEvent`s and interval
/// ticks, and delegates passes to a `PassBackend` and watch registration to
/// a `WatchRegistrar`.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// runtime semantics. At most one pass runs at a time; it is spawned as
/// its own task so events keep flowing into the core while it runs.
pub struct Runtime<B: PassBackend, W: WatchRegistrar> {
    core: CoreRuntime,
    options: RuntimeOptions,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    backend: B,
    registrar: W,
    in_flight: Option<PassHandle>,
}

impl<B: PassBackend, W: WatchRegistrar> fmt::Debug for Runtime<B, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("options", &self.options)
            .field("pass_running", &self.in_flight.is_some())
            .finish_non_exhaustive()
    }
}

impl<B: PassBackend, W: WatchRegistrar> Runtime<B, W> {
    pub fn new(
        options: RuntimeOptions,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        backend: B,
        registrar: W,
    ) -> Self {
        Self {
            core: CoreRuntime::new(options),
            options,
            event_rx,
            backend,
            registrar,
            in_flight: None,
        }
    }

    /// Main event loop.
    ///
    /// - Consumes `RuntimeEvent`s from `event_rx` and interval ticks.
    /// - Feeds them into the core runtime.
    /// - Executes commands returned by the core (watch, run pass).
    ///
    /// On shutdown a pass already running is awaited, not cancelled.
    pub async fn run(mut self) -> Result<()> {
        info!(
            quiet_ms = self.options.quiet_period.as_millis() as u64,
            tick_ms = self.options.tick.as_millis() as u64,
            "mirrorsync runtime started"
        );

        let mut ticker = time::interval(self.options.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let wake = tokio::select! {
                event = self.event_rx.recv() => Wake::Event(event),
                _ = ticker.tick() => Wake::Tick,
                done = wait_for(&mut self.in_flight) => Wake::PassDone(done),
            };

            let event = match wake {
                Wake::Event(Some(event)) => event,
                Wake::Event(None) => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
                Wake::Tick => RuntimeEvent::Tick,
                Wake::PassDone(done) => {
                    self.in_flight = None;
                    log_pass(done);
                    RuntimeEvent::PassCompleted
                }
            };

            if event != RuntimeEvent::Tick {
                debug!(?event, "runtime received event");
            }

            let step = self.core.step(event, Instant::now().into_std());
            for command in step.commands {
                self.execute_command(command);
            }

            if !step.keep_running {
                info!("shutdown requested; stopping runtime");
                break;
            }
        }

        if let Some(handle) = self.in_flight.take() {
            info!("waiting for running pass to finish");
            log_pass(handle.await);
        }

        info!("runtime exiting");
        Ok(())
    }

    fn execute_command(&mut self, command: CoreCommand) {
        match command {
            CoreCommand::WatchTree(path) => self.watch_tree(&path),
            CoreCommand::RunPass(batch) => self.start_pass(batch),
        }
    }

    fn watch_tree(&mut self, path: &Path) {
        if !path.is_dir() {
            return;
        }
        match self.registrar.watch_tree(path) {
            Ok(count) => debug!(path = %path.display(), count, "watching new directories"),
            Err(err) => warn!(path = %path.display(), error = %err, "failed to watch new directory"),
        }
    }

    fn start_pass(&mut self, batch: PendingBatch) {
        if self.in_flight.is_some() {
            // The core never asks for a second pass while one is running.
            warn!("pass already running; ignoring request");
            return;
        }
        self.in_flight = Some(tokio::spawn(self.backend.run_pass(batch)));
    }
}

/// Resolves when the running pass finishes; pends forever if there is none.
async fn wait_for(handle: &mut Option<PassHandle>) -> std::result::Result<Result<PassReport>, JoinError> {
    match handle {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

fn log_pass(done: std::result::Result<Result<PassReport>, JoinError>) {
    match done {
        Ok(Ok(report)) if report.is_clean() => debug!(%report, "pass succeeded"),
        Ok(Ok(report)) => warn!(%report, "pass finished with errors"),
        Ok(Err(err)) => error!(error = %err, "pass aborted"),
        Err(err) => error!(error = %err, "pass task failed"),
    }
}
