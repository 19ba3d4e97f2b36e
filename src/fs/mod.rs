// src/fs/mod.rs

//! Minimal filesystem seam used by content comparison.
//!
//! Production code reads through [`RealFileSystem`]; tests can substitute
//! [`mock::MockFileSystem`] to script metadata changes that would otherwise
//! require racing a real writer.

use std::fmt::Debug;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::time::SystemTime;

pub mod mock;

/// Size and modification time of a file at one instant.
///
/// Two stamps that differ mean the file was written in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl From<&fs::Metadata> for FileStamp {
    fn from(meta: &fs::Metadata) -> Self {
        Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        }
    }
}

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;

    /// Fresh size/mtime of the file at `path` (symlinks are followed).
    fn stamp(&self, path: &Path) -> io::Result<FileStamp>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        let file = fs::File::open(path)?;
        Ok(Box::new(file))
    }

    fn stamp(&self, path: &Path) -> io::Result<FileStamp> {
        let meta = fs::metadata(path)?;
        Ok(FileStamp::from(&meta))
    }
}
