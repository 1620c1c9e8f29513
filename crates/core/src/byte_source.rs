//! Lazy, possibly I/O-backed byte sources.
//!
//! A [`ByteSource`] may be opened any number of times; it does not own a
//! file handle between calls. Concrete sources are file-backed,
//! memory-backed, or zip-backed (the zip-backed implementation lives in
//! `aabforge-bundle`, since it needs the archive reader).

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

/// A re-openable source of bytes.
pub trait ByteSource: Send + Sync + fmt::Debug {
    /// Open a fresh, independent stream over the content.
    fn open_stream(&self) -> io::Result<Box<dyn Read + Send>>;

    /// The content length, if known without reading the whole stream.
    fn size_if_known(&self) -> Option<u64>;

    /// Compute the SHA-256 of the content. Not memoized by the source
    /// itself; callers that reopen the same source repeatedly (notably
    /// `ModuleEntry`) should cache the result alongside the source.
    fn sha256(&self) -> io::Result<[u8; 32]> {
        let mut hasher = Sha256::new();
        let mut stream = self.open_stream()?;
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = stream.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(hasher.finalize().into())
    }
}

/// Content held entirely in memory.
#[derive(Clone)]
pub struct MemoryByteSource(Arc<Vec<u8>>);

impl MemoryByteSource {
    pub fn new(bytes: Vec<u8>) -> Self {
        MemoryByteSource(Arc::new(bytes))
    }
}

impl fmt::Debug for MemoryByteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryByteSource")
            .field("len", &self.0.len())
            .finish()
    }
}

impl ByteSource for MemoryByteSource {
    fn open_stream(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(ArcCursor(io::Cursor::new(Arc::clone(&self.0)))))
    }

    fn size_if_known(&self) -> Option<u64> {
        Some(self.0.len() as u64)
    }
}

/// Local wrapper around `io::Cursor<Arc<Vec<u8>>>` so `Read` can be
/// implemented here without violating the orphan rule (both `Cursor`
/// and `Read` are foreign to this crate).
struct ArcCursor(io::Cursor<Arc<Vec<u8>>>);

impl Read for ArcCursor {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let pos = self.0.position() as usize;
        let data = self.0.get_ref();
        let remaining = &data[pos.min(data.len())..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.0.set_position((pos + n) as u64);
        Ok(n)
    }
}

/// Content backed by a file on disk, opened fresh on every call.
#[derive(Debug, Clone)]
pub struct FileByteSource {
    path: PathBuf,
}

impl FileByteSource {
    pub fn new(path: PathBuf) -> Self {
        FileByteSource { path }
    }
}

impl ByteSource for FileByteSource {
    fn open_stream(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(&self.path)?))
    }

    fn size_if_known(&self) -> Option<u64> {
        std::fs::metadata(&self.path).ok().map(|m| m.len())
    }
}
