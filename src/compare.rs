// src/compare.rs

//! Byte-exact file comparison that notices concurrent writers.
//!
//! Both files are stat'ed, streamed chunk by chunk in lock-step, and
//! stat'ed again. A size or mtime change on either side means the content
//! just read may be torn, so the attempt is discarded and retried. If the
//! files never hold still the comparison is reported as unresolved.

use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::errors::{Result, SyncError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::tree::{EntryKind, Node};

/// 4 MiB per side per read.
pub const DEFAULT_CHUNK_SIZE: usize = 4 << 20;

pub const DEFAULT_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone)]
pub struct Comparator {
    chunk_size: usize,
    attempts: u32,
    fs: Arc<dyn FileSystem>,
}

impl Default for Comparator {
    fn default() -> Self {
        Self::new(Arc::new(RealFileSystem))
    }
}

impl Comparator {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            attempts: DEFAULT_ATTEMPTS,
            fs,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Compare two snapshot nodes.
    ///
    /// Nodes of different kinds are unequal. Two directories are equal by
    /// presence; their contents are the diff's business.
    pub fn are_equal(&self, a: &Node, b: &Node) -> Result<bool> {
        match (a.kind(), b.kind()) {
            (EntryKind::File, EntryKind::File) => self.compare_files(a.path(), b.path()),
            (EntryKind::Directory, EntryKind::Directory) => Ok(true),
            _ => Ok(false),
        }
    }

    /// Compare the bytes of two files, retrying while either one is changing.
    pub fn compare_files(&self, a: &Path, b: &Path) -> Result<bool> {
        let initial_a = self.fs.stamp(a)?;
        let initial_b = self.fs.stamp(b)?;

        if initial_a.len != initial_b.len {
            return Ok(false);
        }

        let mut buf_a = vec![0u8; self.chunk_size];
        let mut buf_b = vec![0u8; self.chunk_size];

        for attempt in 1..=self.attempts {
            if !self.stream_equal(a, b, &mut buf_a, &mut buf_b)? {
                return Ok(false);
            }

            let stable = self.fs.stamp(a)? == initial_a && self.fs.stamp(b)? == initial_b;
            if stable {
                return Ok(true);
            }

            debug!(
                source = %a.display(),
                target = %b.display(),
                attempt,
                "file changed while comparing; retrying"
            );
        }

        Err(SyncError::CompareUnresolved {
            source_path: a.to_path_buf(),
            target_path: b.to_path_buf(),
            attempts: self.attempts,
        })
    }

    fn stream_equal(&self, a: &Path, b: &Path, buf_a: &mut [u8], buf_b: &mut [u8]) -> Result<bool> {
        let mut reader_a = self.fs.open_read(a)?;
        let mut reader_b = self.fs.open_read(b)?;

        loop {
            let n_a = read_full(&mut reader_a, buf_a)?;
            let n_b = read_full(&mut reader_b, buf_b)?;

            if n_a != n_b || buf_a[..n_a] != buf_b[..n_b] {
                return Ok(false);
            }

            // A short read means both sides hit end of stream together.
            if n_a < buf_a.len() {
                return Ok(true);
            }
        }
    }
}

/// Fill `buf` as far as the stream allows; a short count means end of stream.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
