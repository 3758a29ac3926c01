//! Ogg page headers.
//!
//! An Ogg bitstream is a run of pages. Each page starts with a 27-byte header
//! followed by a segment table of `segment_count` lacing values:
//!
//! | offset | size | field                    |
//! |--------|------|--------------------------|
//! | 0      | 4    | capture pattern `OggS`   |
//! | 4      | 1    | stream structure version |
//! | 5      | 1    | header type flags        |
//! | 6      | 8    | granule position (LE)    |
//! | 14     | 4    | serial number (LE)       |
//! | 18     | 4    | page sequence (LE)       |
//! | 22     | 4    | CRC (not verified)       |
//! | 26     | 1    | segment count            |
//!
//! The page body is the sum of the lacing values.

use anyhow::Result;

use crate::utils::source::ByteSource;

pub const CAPTURE_PATTERN: &[u8; 4] = b"OggS";

/// First page of a logical bitstream.
pub const FLAG_BOS: u8 = 0x02;
/// Last page of a logical bitstream.
pub const FLAG_EOS: u8 = 0x04;

/// Offset of the header type flags inside a page.
pub const FLAGS_OFFSET: u64 = 5;

/// Header size of a page without segment table; also the smallest possible page.
pub const MIN_PAGE_SIZE: u64 = 27;

/// Size of the minimal first page of a stream (header, one lacing value and a
/// 30-byte identification packet).
pub const FIRST_PAGE_SIZE: u64 = 58;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OggPageHeader {
    pub flags: u8,
    pub serial: u32,
    pub sequence: u32,
    pub segment_count: u8,
    pub segment_sizes: Vec<u8>,
    pub page_size: u64,
}

impl OggPageHeader {
    /// Reads the page starting at `offset`.
    ///
    /// Returns `None` when no capture pattern is present there, or when the header or
    /// its segment table is cut off by the end of the source.
    pub fn read<S: ByteSource + ?Sized>(source: &mut S, offset: u64) -> Result<Option<Self>> {
        let mut header = [0u8; MIN_PAGE_SIZE as usize];
        if !source.try_read_exact_at(offset, &mut header)? {
            return Ok(None);
        }
        if &header[..4] != CAPTURE_PATTERN {
            return Ok(None);
        }

        let segment_count = header[26];
        let mut segment_sizes = vec![0u8; segment_count as usize];
        if !source.try_read_exact_at(offset + MIN_PAGE_SIZE, &mut segment_sizes)? {
            return Ok(None);
        }

        let body: u64 = segment_sizes.iter().map(|&s| s as u64).sum();

        Ok(Some(Self {
            flags: header[FLAGS_OFFSET as usize],
            serial: u32::from_le_bytes([header[14], header[15], header[16], header[17]]),
            sequence: u32::from_le_bytes([header[18], header[19], header[20], header[21]]),
            segment_count,
            segment_sizes,
            page_size: MIN_PAGE_SIZE + segment_count as u64 + body,
        }))
    }

    pub fn is_first(&self) -> bool {
        self.flags & FLAG_BOS != 0
    }

    pub fn is_last(&self) -> bool {
        self.flags & FLAG_EOS != 0
    }
}
