// src/config/validate.rs

use std::path::{Path, PathBuf};

use crate::config::interval::parse_interval;
use crate::config::model::{Config, RawConfig};
use crate::errors::{Result, SyncError};
use crate::types::ConfigLogLevel;

impl TryFrom<RawConfig> for Config {
    type Error = crate::errors::SyncError;

    fn try_from(raw: RawConfig) -> std::result::Result<Self, Self::Error> {
        let source_dir = validate_root("source_dir", &raw.source_dir)?;
        let target_dir = validate_root("target_dir", &raw.target_dir)?;
        validate_disjoint_roots(&source_dir, &target_dir)?;
        validate_max_fill(raw.max_fill)?;

        if raw.max_open_files == 0 {
            return Err(SyncError::ConfigError(
                "max_open_files must be >= 1 (got 0)".to_string(),
            ));
        }

        let sync_delay = parse_interval(&raw.sync_delay)
            .map_err(|e| SyncError::ConfigError(format!("sync_delay: {e}")))?;
        if sync_delay.is_zero() {
            return Err(SyncError::ConfigError(
                "sync_delay must be greater than zero".to_string(),
            ));
        }

        let log_level: ConfigLogLevel = raw.log_level.parse().map_err(SyncError::ConfigError)?;

        Ok(Config {
            source_dir,
            target_dir,
            max_fill: raw.max_fill,
            log_level,
            sync_delay,
            max_open_files: raw.max_open_files,
            approved_extensions: normalize_extensions(&raw.approved_extensions)?,
            log_file: raw.log_file,
            initial_sync: raw.initial_sync,
        })
    }
}

fn validate_root(key: &str, raw: &str) -> Result<PathBuf> {
    if raw.trim().is_empty() {
        return Err(SyncError::ConfigError(format!("{key} must be set")));
    }

    let path = Path::new(raw);
    let canonical = path
        .canonicalize()
        .map_err(|e| SyncError::ConfigError(format!("{key} {raw:?} is not accessible: {e}")))?;

    if !canonical.is_dir() {
        return Err(SyncError::ConfigError(format!(
            "{key} {raw:?} is not a directory"
        )));
    }

    Ok(canonical)
}

fn validate_disjoint_roots(source: &Path, target: &Path) -> Result<()> {
    if source == target {
        return Err(SyncError::ConfigError(format!(
            "source_dir and target_dir both resolve to {source:?}"
        )));
    }
    if target.starts_with(source) || source.starts_with(target) {
        return Err(SyncError::ConfigError(format!(
            "source_dir {source:?} and target_dir {target:?} must not be nested in each other"
        )));
    }
    Ok(())
}

fn validate_max_fill(max_fill: f64) -> Result<()> {
    if !(max_fill > 0.0 && max_fill <= 1.0) {
        return Err(SyncError::ConfigError(format!(
            "max_fill must be in (0, 1] (got {max_fill})"
        )));
    }
    Ok(())
}

fn normalize_extensions(raw: &[String]) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(raw.len());
    for ext in raw {
        let ext = ext.trim().trim_start_matches('.').to_lowercase();
        if ext.is_empty() || ext.contains(['/', '\\', '*', '?', '[', '{']) {
            return Err(SyncError::ConfigError(format!(
                "approved_extensions contains an invalid entry: {ext:?}"
            )));
        }
        if !out.contains(&ext) {
            out.push(ext);
        }
    }
    Ok(out)
}
