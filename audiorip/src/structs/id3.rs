//! ID3 tags surrounding MPEG audio streams.
//!
//! - **ID3v1**: fixed 128-byte trailer starting with `TAG`, appended after the last frame.
//! - **ID3v2**: prepended tag with a 10-byte header; its size field is a synchsafe
//!   integer (four bytes, high bit of each clear, 7 significant bits per byte).

use anyhow::Result;

use crate::utils::bitstream_io::BsSliceReader;

pub const ID3V1_MARKER: &[u8; 3] = b"TAG";
pub const ID3V1_TAG_SIZE: u64 = 128;

pub const ID3V2_MARKER: &[u8; 3] = b"ID3";
pub const ID3V2_HEADER_SIZE: u64 = 10;

/// Offset of the synchsafe size field inside an ID3v2 header.
pub const ID3V2_SIZE_OFFSET: usize = 6;

/// Footer present flag (ID3v2.4).
pub const ID3V2_FLAG_FOOTER: u8 = 0x10;

/// Decodes a synchsafe integer, or `None` if any byte has its high bit set.
pub fn synchsafe(bytes: &[u8; 4]) -> Result<Option<u32>> {
    let reader = &mut BsSliceReader::from_slice(bytes);
    let mut value = 0u32;

    for _ in 0..bytes.len() {
        if reader.get()? {
            return Ok(None);
        }
        let low: u32 = reader.get_n(7)?;
        value = (value << 7) | low;
    }

    Ok(Some(value))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Id3v2Header {
    pub major: u8,
    pub revision: u8,
    pub flags: u8,
    /// Tag size excluding the header (and footer, if present).
    pub size: u32,
}

impl Id3v2Header {
    /// Parses a 10-byte tag header. Returns `None` unless the marker is present and
    /// every size byte is synchsafe.
    pub fn parse(header: &[u8; ID3V2_HEADER_SIZE as usize]) -> Result<Option<Self>> {
        if &header[..3] != ID3V2_MARKER {
            return Ok(None);
        }

        let mut size_bytes = [0u8; 4];
        size_bytes.copy_from_slice(&header[ID3V2_SIZE_OFFSET..]);
        let Some(size) = synchsafe(&size_bytes)? else {
            return Ok(None);
        };

        Ok(Some(Self {
            major: header[3],
            revision: header[4],
            flags: header[5],
            size,
        }))
    }

    /// Bytes covered by the tag including header and optional footer.
    pub fn total_len(&self) -> u64 {
        let footer = if self.flags & ID3V2_FLAG_FOOTER != 0 {
            ID3V2_HEADER_SIZE
        } else {
            0
        };
        ID3V2_HEADER_SIZE + self.size as u64 + footer
    }
}
