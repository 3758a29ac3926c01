//! Block-buffered pattern search over a bounded range of a [`ByteSource`].
//!
//! Both searches are pure queries: they never modify the source and can be restarted
//! from any offset with overlapping ranges.

use anyhow::{Result, bail};

use crate::utils::errors::{SearchError, SourceError};
use crate::utils::source::ByteSource;

/// Comparison block for [`search_string`]. Needles longer than this are rejected.
pub const SEARCH_BLOCK_SIZE: usize = 4096;

/// Block for [`search_byte`]. Kept small because the MPEG scan restarts one byte after
/// every rejected sync candidate, and the unread tail of a block is wasted each time.
pub const BYTE_SEARCH_BLOCK_SIZE: usize = 512;

/// A block buffer that slides over `[start, end)` of a source and carries the last
/// `carry` bytes of each block to the front of the next one.
///
/// With `carry = needle.len() - 1` every start offset in the range whose match would
/// fit before `end` appears, with the full needle span, in exactly one block.
#[derive(Debug)]
pub struct CarryBuffer {
    buf: Vec<u8>,
    carry: usize,
    len: usize,
    base: u64,
    next: u64,
    end: u64,
}

impl CarryBuffer {
    pub fn new(block_size: usize, carry: usize, start: u64, end: u64) -> Self {
        assert!(carry < block_size, "carry must be smaller than the block");
        Self {
            buf: vec![0u8; block_size],
            carry,
            len: 0,
            base: start,
            next: start,
            end: end.max(start),
        }
    }

    /// Moves the carried tail to the front and reads the next block behind it.
    ///
    /// Returns `Ok(false)` once the range is exhausted; the block is then stale.
    pub fn fill<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<bool, SourceError> {
        if self.len > 0 {
            let keep = self.carry.min(self.len);
            self.buf.copy_within(self.len - keep..self.len, 0);
            self.base += (self.len - keep) as u64;
            self.len = keep;
        }

        if self.next >= self.end {
            return Ok(false);
        }

        let room = (self.buf.len() - self.len) as u64;
        let want = room.min(self.end - self.next) as usize;
        let n = source.read_at(self.next, &mut self.buf[self.len..self.len + want])?;
        if n == 0 {
            return Ok(false);
        }

        self.len += n;
        self.next += n as u64;
        Ok(true)
    }

    /// Valid bytes of the current block, carried prefix included.
    pub fn block(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Absolute offset of `block()[0]`.
    pub fn base(&self) -> u64 {
        self.base
    }
}

/// Finds the first occurrence of `needle` lying entirely inside
/// `[start, start + range)`, clipped to the source size.
///
/// Fails with [`SearchError`] before touching the source if the needle is empty or
/// longer than [`SEARCH_BLOCK_SIZE`].
pub fn search_string<S: ByteSource + ?Sized>(
    source: &mut S,
    start: u64,
    range: u64,
    needle: &[u8],
) -> Result<Option<u64>> {
    if needle.is_empty() {
        bail!(SearchError::EmptyNeedle);
    }
    if needle.len() > SEARCH_BLOCK_SIZE {
        bail!(SearchError::NeedleTooLong {
            len: needle.len(),
            max: SEARCH_BLOCK_SIZE,
        });
    }

    let end = start.saturating_add(range).min(source.size());
    if end <= start || end - start < needle.len() as u64 {
        return Ok(None);
    }

    let mut window = CarryBuffer::new(SEARCH_BLOCK_SIZE, needle.len() - 1, start, end);
    while window.fill(source)? {
        if let Some(i) = window
            .block()
            .windows(needle.len())
            .position(|candidate| candidate == needle)
        {
            return Ok(Some(window.base() + i as u64));
        }
    }

    Ok(None)
}

/// Finds the first `target` byte in `[start, start + range)`, clipped to the source size.
pub fn search_byte<S: ByteSource + ?Sized>(
    source: &mut S,
    start: u64,
    range: u64,
    target: u8,
) -> Result<Option<u64>> {
    let end = start.saturating_add(range).min(source.size());
    let mut window = CarryBuffer::new(BYTE_SEARCH_BLOCK_SIZE, 0, start, end);

    while window.fill(source)? {
        if let Some(i) = window.block().iter().position(|&b| b == target) {
            return Ok(Some(window.base() + i as u64));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::source::tests::{MemorySource, memory};

    /// Counts reads so tests can prove a call touched no data.
    struct CountingSource {
        inner: MemorySource,
        reads: usize,
    }

    impl ByteSource for CountingSource {
        fn size(&self) -> u64 {
            self.inner.size()
        }

        fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, SourceError> {
            self.reads += 1;
            self.inner.read_at(offset, buf)
        }
    }

    fn haystack(len: usize, at: usize, needle: &[u8]) -> Vec<u8> {
        let mut data = vec![0x55u8; len];
        data[at..at + needle.len()].copy_from_slice(needle);
        data
    }

    #[test]
    fn test_finds_needle_straddling_block_boundary() -> Result<()> {
        let at = SEARCH_BLOCK_SIZE - 1;
        let mut source = memory(haystack(3 * SEARCH_BLOCK_SIZE, at, b"OggS"));
        let size = source.size();

        let found = search_string(&mut source, 0, size, b"OggS")?;
        assert_eq!(found, Some(at as u64));
        Ok(())
    }

    #[test]
    fn test_every_offset_is_examined() -> Result<()> {
        let len = 2 * SEARCH_BLOCK_SIZE + 17;
        for at in [
            0,
            SEARCH_BLOCK_SIZE - 4,
            SEARCH_BLOCK_SIZE - 3,
            SEARCH_BLOCK_SIZE - 2,
            SEARCH_BLOCK_SIZE,
            2 * SEARCH_BLOCK_SIZE - 5,
            len - 4,
        ] {
            let mut source = memory(haystack(len, at, b"RIFF"));
            let found = search_string(&mut source, 0, len as u64, b"RIFF")?;
            assert_eq!(found, Some(at as u64), "needle at {at}");
        }
        Ok(())
    }

    #[test]
    fn test_match_must_fit_inside_range() -> Result<()> {
        let mut source = memory(haystack(64, 30, b"ID3"));

        assert_eq!(search_string(&mut source, 0, 33, b"ID3")?, Some(30));
        assert_eq!(search_string(&mut source, 0, 32, b"ID3")?, None);
        assert_eq!(search_string(&mut source, 31, 33, b"ID3")?, None);
        assert_eq!(search_string(&mut source, 30, 2, b"ID3")?, None);
        Ok(())
    }

    #[test]
    fn test_range_is_clipped_to_source() -> Result<()> {
        let mut source = memory(haystack(100, 96, b"TAG"));
        assert_eq!(search_string(&mut source, 90, u64::MAX, b"TAG")?, Some(96));
        assert_eq!(search_string(&mut source, 200, 10, b"TAG")?, None);
        Ok(())
    }

    #[test]
    fn test_oversized_needle_fails_without_io() {
        let mut source = CountingSource {
            inner: memory(vec![0u8; 3 * SEARCH_BLOCK_SIZE]),
            reads: 0,
        };
        let needle = vec![0u8; SEARCH_BLOCK_SIZE + 1];

        let err = search_string(&mut source, 0, 3 * SEARCH_BLOCK_SIZE as u64, &needle)
            .expect_err("needle longer than the block must be refused");
        assert_eq!(
            err.downcast_ref::<SearchError>(),
            Some(&SearchError::NeedleTooLong {
                len: SEARCH_BLOCK_SIZE + 1,
                max: SEARCH_BLOCK_SIZE,
            })
        );
        assert_eq!(source.reads, 0);

        let err = search_string(&mut source, 0, 16, b"").expect_err("empty needle");
        assert_eq!(
            err.downcast_ref::<SearchError>(),
            Some(&SearchError::EmptyNeedle)
        );
        assert_eq!(source.reads, 0);
    }

    #[test]
    fn test_needle_of_full_block_length() -> Result<()> {
        let needle: Vec<u8> = (0..SEARCH_BLOCK_SIZE).map(|i| (i % 251) as u8).collect();
        let mut data = vec![0xFFu8; 3 * SEARCH_BLOCK_SIZE];
        data[1000..1000 + needle.len()].copy_from_slice(&needle);
        let mut source = memory(data);
        let size = source.size();

        assert_eq!(search_string(&mut source, 0, size, &needle)?, Some(1000));
        Ok(())
    }

    #[test]
    fn test_byte_search_across_blocks() -> Result<()> {
        let mut data = vec![0u8; 5 * BYTE_SEARCH_BLOCK_SIZE];
        data[BYTE_SEARCH_BLOCK_SIZE] = 0xFF;
        data[3 * BYTE_SEARCH_BLOCK_SIZE + 7] = 0xFF;
        let mut source = memory(data);
        let size = source.size();

        let first = search_byte(&mut source, 0, size, 0xFF)?;
        assert_eq!(first, Some(BYTE_SEARCH_BLOCK_SIZE as u64));

        let next = search_byte(&mut source, first.unwrap() + 1, size, 0xFF)?;
        assert_eq!(next, Some(3 * BYTE_SEARCH_BLOCK_SIZE as u64 + 7));

        assert_eq!(search_byte(&mut source, next.unwrap() + 1, size, 0xFF)?, None);
        Ok(())
    }

    #[test]
    fn test_byte_search_respects_range() -> Result<()> {
        let mut data = vec![0u8; 64];
        data[40] = 0xFF;
        let mut source = memory(data);

        assert_eq!(search_byte(&mut source, 0, 40, 0xFF)?, None);
        assert_eq!(search_byte(&mut source, 0, 41, 0xFF)?, Some(40));
        Ok(())
    }

    #[test]
    fn test_carry_buffer_keeps_tail() -> Result<(), SourceError> {
        let mut source = memory((0u8..20).collect());
        let mut window = CarryBuffer::new(8, 3, 0, 20);

        assert!(window.fill(&mut source)?);
        assert_eq!(window.base(), 0);
        assert_eq!(window.block(), &[0, 1, 2, 3, 4, 5, 6, 7]);

        assert!(window.fill(&mut source)?);
        assert_eq!(window.base(), 5);
        assert_eq!(window.block(), &[5, 6, 7, 8, 9, 10, 11, 12]);

        assert!(window.fill(&mut source)?);
        assert!(window.fill(&mut source)?);
        assert_eq!(window.base(), 15);
        assert_eq!(window.block(), &[15, 16, 17, 18, 19]);

        assert!(!window.fill(&mut source)?);
        Ok(())
    }
}
