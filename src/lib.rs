// src/lib.rs

pub mod capacity;
pub mod cli;
pub mod compare;
pub mod config;
pub mod context;
pub mod diff;
pub mod engine;
pub mod errors;
pub mod filter;
pub mod fs;
pub mod logging;
pub mod replicate;
pub mod tree;
pub mod types;
pub mod watch;

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::Config;
use crate::context::SyncContext;
use crate::engine::pass::plan_copy;
use crate::engine::{PendingBatch, RealPassBackend, Runtime, RuntimeEvent, RuntimeOptions, reconcile};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - the shared sync context
/// - the initial reconciliation pass
/// - the debounce runtime and its pass backend
/// - the file watcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs, cfg: Config) -> Result<()> {
    let ctx = Arc::new(SyncContext::from_config(&cfg)?);

    if args.dry_run {
        print!("{}", dry_run_report(&cfg, &ctx).await?);
        return Ok(());
    }

    if cfg.initial_sync || args.once {
        info!("running initial reconciliation");
        reconcile(&ctx, &PendingBatch::new()).await?;
    }

    if args.once {
        return Ok(());
    }

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(1024);

    let watcher = crate::watch::spawn_watcher(ctx.source_root(), ctx.filter().clone(), rt_tx.clone())?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let options = RuntimeOptions::new(cfg.sync_delay);
    let runtime = Runtime::new(options, rt_rx, RealPassBackend::new(Arc::clone(&ctx)), watcher);
    runtime.run().await?;
    Ok(())
}

/// Dry-run output: settings, target fill, the source snapshot and what a
/// pass would copy right now. Touches nothing on disk.
pub async fn dry_run_report(cfg: &Config, ctx: &SyncContext) -> crate::errors::Result<String> {
    let (source, _target, missing) = plan_copy(ctx).await?;
    let fill = ctx.capacity().current_fill(ctx.target_root())?;

    let mut out = String::new();
    let _ = writeln!(out, "mirrorsync dry-run");
    let _ = writeln!(out, "  source_dir = {}", ctx.source_root().display());
    let _ = writeln!(out, "  target_dir = {}", ctx.target_root().display());
    let _ = writeln!(out, "  target fill = {:.3} (max_fill {:.3})", fill, ctx.capacity().max_fill());
    let _ = writeln!(out, "  sync_delay = {:?}", cfg.sync_delay);
    let _ = writeln!(out, "  max_open_files = {}", cfg.max_open_files);
    if !cfg.approved_extensions.is_empty() {
        let _ = writeln!(out, "  approved_extensions = {:?}", cfg.approved_extensions);
    }

    let _ = writeln!(out, "\nsource snapshot ({} entries):\n{source}", source.len());
    let _ = writeln!(
        out,
        "missing ({} entries, {} bytes):",
        missing.entry_count(),
        missing.file_bytes(&source)
    );
    for (dir, names) in missing.describe(&source) {
        let _ = writeln!(out, "  {}", dir.display());
        for name in names {
            let _ = writeln!(out, "    - {name}");
        }
    }

    debug!("dry-run complete (nothing copied)");
    Ok(out)
}
