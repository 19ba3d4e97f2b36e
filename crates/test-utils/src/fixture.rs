#![allow(dead_code)]

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use mirrorsync::config::{Config, RawConfig};
use mirrorsync::context::SyncContext;

/// A temporary `src/` + `dst/` pair with helpers to populate and inspect it.
///
/// Paths are canonical, matching what snapshots and the watcher report.
pub struct MirrorFixture {
    _dir: TempDir,
    source: PathBuf,
    target: PathBuf,
}

impl MirrorFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create tempdir");
        let root = dir.path().canonicalize().expect("canonicalize tempdir");
        let source = root.join("src");
        let target = root.join("dst");
        fs::create_dir(&source).expect("create src");
        fs::create_dir(&target).expect("create dst");
        Self {
            _dir: dir,
            source,
            target,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn write_source(&self, rel: &str, contents: impl AsRef<[u8]>) -> &Self {
        write_file(&self.source.join(rel), contents.as_ref());
        self
    }

    pub fn write_target(&self, rel: &str, contents: impl AsRef<[u8]>) -> &Self {
        write_file(&self.target.join(rel), contents.as_ref());
        self
    }

    pub fn mkdir_source(&self, rel: &str) -> &Self {
        fs::create_dir_all(self.source.join(rel)).expect("create source dir");
        self
    }

    pub fn mkdir_target(&self, rel: &str) -> &Self {
        fs::create_dir_all(self.target.join(rel)).expect("create target dir");
        self
    }

    /// Raw config over this pair with the capacity guard disabled, so tests
    /// do not depend on how full the machine's disk is.
    pub fn raw_config(&self) -> RawConfig {
        let mut raw = RawConfig::with_roots(
            self.source.to_string_lossy(),
            self.target.to_string_lossy(),
        );
        raw.max_fill = 1.0;
        raw.max_open_files = 8;
        raw.sync_delay = "1s".to_string();
        raw
    }

    pub fn config(&self) -> Config {
        Config::try_from(self.raw_config()).expect("fixture config is valid")
    }

    pub fn context(&self) -> SyncContext {
        self.context_with(self.raw_config())
    }

    pub fn context_with(&self, raw: RawConfig) -> SyncContext {
        let cfg = Config::try_from(raw).expect("fixture config is valid");
        SyncContext::from_config(&cfg).expect("fixture context")
    }

    pub fn read_target(&self, rel: &str) -> Option<Vec<u8>> {
        fs::read(self.target.join(rel)).ok()
    }

    pub fn source_entries(&self) -> BTreeSet<String> {
        list_entries(&self.source)
    }

    pub fn target_entries(&self) -> BTreeSet<String> {
        list_entries(&self.target)
    }
}

impl Default for MirrorFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn write_file(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, contents).expect("write file");
}

/// Every entry under `root` as a `/`-separated relative path, directories
/// with a trailing `/`. Hidden entries are included.
pub fn list_entries(root: &Path) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).expect("list dir") {
            let entry = entry.expect("dir entry");
            let path = entry.path();
            let rel = path
                .strip_prefix(root)
                .expect("entry under root")
                .to_string_lossy()
                .replace('\\', "/");
            if entry.file_type().expect("file type").is_dir() {
                out.insert(format!("{rel}/"));
                stack.push(path);
            } else {
                out.insert(rel);
            }
        }
    }
    out
}
