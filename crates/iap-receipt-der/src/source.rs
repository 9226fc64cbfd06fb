//! Byte sources: bounded random-access readers.
//!
//! The decoder is source-agnostic. Implementations include an owned
//! in-memory buffer and a file handle that is held for the lifetime of the
//! source and closed when it is dropped.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bytes::Bytes;

use crate::error::SourceError;
use crate::tag::ByteRange;

/// Random-access reads over an opaque byte container.
///
/// Every read is bounds-checked against [`ByteSource::len`]. There is no
/// caching; callers request the smallest range they need.
pub trait ByteSource {
    /// Total size in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read exactly `range`. Fails with `OutOfBounds` past the end.
    fn read(&self, range: ByteRange) -> Result<Bytes, SourceError>;

    /// The range covering the whole source.
    fn full_range(&self) -> ByteRange {
        ByteRange::new(0, self.len())
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &S {
    fn len(&self) -> u64 {
        (**self).len()
    }

    fn read(&self, range: ByteRange) -> Result<Bytes, SourceError> {
        (**self).read(range)
    }
}

/// Check `range` against a source of `size` bytes.
pub fn check_bounds(range: ByteRange, size: u64) -> Result<(), SourceError> {
    match range.offset.checked_add(range.length) {
        Some(end) if end <= size => Ok(()),
        _ => Err(SourceError::OutOfBounds {
            offset: range.offset,
            length: range.length,
            size,
        }),
    }
}

/// An owned in-memory buffer. Reads are zero-copy slices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySource {
    data: Bytes,
}

impl MemorySource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl ByteSource for MemorySource {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn read(&self, range: ByteRange) -> Result<Bytes, SourceError> {
        check_bounds(range, self.len())?;
        // Both casts are lossless: the range is within a buffer that fits in memory.
        let start = range.offset as usize;
        let end = range.end() as usize;
        Ok(self.data.slice(start..end))
    }
}

/// A file opened once and read with positioned reads.
///
/// The handle is released when the source is dropped, on every exit path.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    file: Mutex<File>,
    len: u64,
}

impl FileSource {
    /// Open `path` with no size limit.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        Self::open_with_limit(path, u64::MAX)
    }

    /// Open `path`, refusing files larger than `limit` bytes.
    pub fn open_with_limit(path: impl AsRef<Path>, limit: u64) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let len = file.metadata()?.len();
        if len > limit {
            return Err(SourceError::TooLarge { size: len, limit });
        }
        Ok(Self {
            path,
            file: Mutex::new(file),
            len,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn read(&self, range: ByteRange) -> Result<Bytes, SourceError> {
        check_bounds(range, self.len)?;
        let length = usize::try_from(range.length).map_err(|_| SourceError::TooLarge {
            size: range.length,
            limit: usize::MAX as u64,
        })?;

        let mut file = self.file.lock().map_err(|_| {
            SourceError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "file source lock poisoned",
            ))
        })?;
        file.seek(SeekFrom::Start(range.offset))?;
        let mut buf = vec![0u8; length];
        file.read_exact(&mut buf)?;
        Ok(Bytes::from(buf))
    }
}
