// src/config/mod.rs

//! Configuration loading and validation for mirrorsync.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Parse `sync_delay` style intervals (`interval.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate roots, limits and intervals (`validate.rs`).

pub mod interval;
pub mod loader;
pub mod model;
pub mod validate;

pub use interval::parse_interval;
pub use loader::{load_and_validate, load_from_path};
pub use model::{Config, RawConfig};
