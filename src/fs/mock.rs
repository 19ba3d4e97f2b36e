// src/fs/mock.rs

use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use super::{FileStamp, FileSystem};

#[derive(Debug, Clone)]
struct MockFile {
    content: Vec<u8>,
    modified: SystemTime,
    /// Bump `modified` on every stat, simulating a writer that never stops.
    churn: bool,
    stats: usize,
}

/// In-memory files with controllable metadata.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockFile>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn files(&self) -> MutexGuard<'_, HashMap<PathBuf, MockFile>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.files().insert(
            path.as_ref().to_path_buf(),
            MockFile {
                content: content.into(),
                modified: SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000),
                churn: false,
                stats: 0,
            },
        );
    }

    /// Make every subsequent stat of `path` report a newer modification time.
    pub fn keep_modifying(&self, path: impl AsRef<Path>) {
        if let Some(file) = self.files().get_mut(path.as_ref()) {
            file.churn = true;
        }
    }

    /// How many times `path` has been stat'ed.
    pub fn stat_count(&self, path: impl AsRef<Path>) -> usize {
        self.files().get(path.as_ref()).map_or(0, |f| f.stats)
    }
}

impl FileSystem for MockFileSystem {
    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        match self.files().get(path) {
            Some(file) => Ok(Box::new(Cursor::new(file.content.clone()))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {path:?}"),
            )),
        }
    }

    fn stamp(&self, path: &Path) -> io::Result<FileStamp> {
        let mut files = self.files();
        let file = files.get_mut(path).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("file not found: {path:?}"))
        })?;

        file.stats += 1;
        if file.churn {
            file.modified += Duration::from_millis(1);
        }

        Ok(FileStamp {
            len: file.content.len() as u64,
            modified: Some(file.modified),
        })
    }
}
