// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `mirrorsync`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mirrorsync",
    version,
    about = "Keep a target directory a one-way mirror of a source directory.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `mirrorsync.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "mirrorsync.toml")]
    pub config: String,

    /// Run one reconciliation pass and exit, no watching.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MIRRORSYNC_LOG`, the config's `log_level` or a default
    /// level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Snapshot both roots and print what is missing, but don't touch anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
