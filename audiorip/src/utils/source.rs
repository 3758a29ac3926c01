//! Read-only random access over a fixed-size input.
//!
//! Every scanning component reads through [`ByteSource`]. Reads are bounds-checked
//! against the size captured when the source was opened; the source is never written.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::utils::errors::SourceError;

/// Seekable, read-only view of a fixed-size binary input.
pub trait ByteSource {
    /// Total size of the input in bytes.
    fn size(&self) -> u64;

    /// Reads up to `buf.len()` bytes starting at `offset`, clipped to the end of
    /// the source. Returns the number of bytes copied (0 at or past the end).
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, SourceError>;

    /// Fills `buf` from `offset`, failing if the range leaves the source.
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), SourceError> {
        if !self.try_read_exact_at(offset, buf)? {
            return Err(SourceError::OutOfBounds {
                offset,
                len: buf.len() as u64,
                size: self.size(),
            });
        }
        Ok(())
    }

    /// Fills `buf` from `offset` if the whole range lies inside the source.
    ///
    /// Returns `Ok(false)` without reading when it does not.
    fn try_read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<bool, SourceError> {
        if !self.contains(offset, buf.len() as u64) {
            return Ok(false);
        }
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_at(offset + filled as u64, &mut buf[filled..])?;
            if n == 0 {
                return Err(SourceError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("source ended early at offset {}", offset + filled as u64),
                )));
            }
            filled += n;
        }
        Ok(true)
    }

    /// Reads the single byte at `offset`, or `None` past the end.
    fn byte_at(&mut self, offset: u64) -> Result<Option<u8>, SourceError> {
        let mut b = [0u8; 1];
        Ok(self.try_read_exact_at(offset, &mut b)?.then_some(b[0]))
    }

    /// True when `[offset, offset + len)` lies inside the source.
    fn contains(&self, offset: u64, len: u64) -> bool {
        offset
            .checked_add(len)
            .is_some_and(|end| end <= self.size())
    }
}

/// [`ByteSource`] over any seekable reader. The size is fixed at construction.
#[derive(Debug)]
pub struct ReaderSource<R: Read + Seek> {
    inner: R,
    size: u64,
}

/// A [`ByteSource`] backed by a file on disk.
pub type FileSource = ReaderSource<File>;

impl<R: Read + Seek> ReaderSource<R> {
    pub fn new(mut inner: R) -> io::Result<Self> {
        let size = inner.seek(SeekFrom::End(0))?;
        Ok(Self { inner, size })
    }
}

impl FileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Self::new(File::open(path)?)
    }
}

impl<R: Read + Seek> ByteSource for ReaderSource<R> {
    fn size(&self) -> u64 {
        self.size
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, SourceError> {
        if offset >= self.size || buf.is_empty() {
            return Ok(0);
        }
        let want = buf.len().min((self.size - offset) as usize);
        self.inner.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < want {
            match self.inner.read(&mut buf[filled..want]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}
