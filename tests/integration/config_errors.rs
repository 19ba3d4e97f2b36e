// tests/integration/config_errors.rs

use std::io::Write;

use tempfile::NamedTempFile;

use mirrorsync::config::{load_and_validate, load_from_path};
use mirrorsync::errors::SyncError;

use crate::common::MirrorFixture;

fn write_config(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{body}").unwrap();
    file
}

fn roots_toml(fx: &MirrorFixture) -> String {
    format!(
        "source_dir = {:?}\ntarget_dir = {:?}\n",
        fx.source().to_string_lossy(),
        fx.target().to_string_lossy()
    )
}

#[test]
fn full_config_round_trips_through_toml() {
    let fx = MirrorFixture::new();
    let file = write_config(&format!(
        "{}max_fill = 0.5\nsync_delay = \"5m\"\nmax_open_files = 4\napproved_extensions = [\".MKV\", \"srt\"]\nlog_level = \"debug\"\ninitial_sync = false\n",
        roots_toml(&fx)
    ));

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.source_dir, fx.source());
    assert_eq!(cfg.sync_delay, std::time::Duration::from_secs(300));
    assert_eq!(cfg.max_open_files, 4);
    assert_eq!(cfg.approved_extensions, vec!["mkv".to_string(), "srt".to_string()]);
    assert!(!cfg.initial_sync);
}

#[test]
fn malformed_interval_is_a_structured_error() {
    let fx = MirrorFixture::new();
    for bad in ["30", "5 m", "1d", "-3s", ""] {
        let file = write_config(&format!("{}sync_delay = {bad:?}\n", roots_toml(&fx)));
        let err = load_and_validate(file.path()).unwrap_err();
        assert!(
            matches!(err, SyncError::ConfigError(ref msg) if msg.contains("sync_delay")),
            "{bad:?} gave {err}"
        );
    }
}

#[test]
fn missing_roots_are_rejected() {
    let file = write_config("max_fill = 0.5\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(SyncError::ConfigError(_))
    ));
}

#[test]
fn nonexistent_root_is_rejected() {
    let fx = MirrorFixture::new();
    let file = write_config(&format!(
        "source_dir = {:?}\ntarget_dir = {:?}\n",
        fx.source().join("nope").to_string_lossy(),
        fx.target().to_string_lossy()
    ));
    assert!(matches!(
        load_and_validate(file.path()),
        Err(SyncError::ConfigError(_))
    ));
}

#[test]
fn out_of_range_limits_are_rejected() {
    let fx = MirrorFixture::new();
    for extra in ["max_fill = 1.5", "max_fill = 0.0", "max_open_files = 0"] {
        let file = write_config(&format!("{}{extra}\n", roots_toml(&fx)));
        assert!(
            matches!(load_and_validate(file.path()), Err(SyncError::ConfigError(_))),
            "{extra} was accepted"
        );
    }
}

#[test]
fn invalid_toml_is_a_toml_error() {
    let file = write_config("source_dir = [unterminated");
    assert!(matches!(load_from_path(file.path()), Err(SyncError::TomlError(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_from_path(dir.path().join("absent.toml")),
        Err(SyncError::IoError(_))
    ));
}
