//! RIFF/WAVE container header.
//!
//! A RIFF file begins with a 12-byte header: the tag `RIFF`, a little-endian chunk
//! size covering everything after the size field, and the form type (`WAVE` for
//! audio). The total file length is therefore `chunk_size + 8`.

use anyhow::Result;

use crate::utils::source::ByteSource;

pub const RIFF_TAG: &[u8; 4] = b"RIFF";
pub const WAVE_FORM: &[u8; 4] = b"WAVE";

/// Tag and size field preceding the form type.
pub const RIFF_PREAMBLE_SIZE: u64 = 8;
pub const RIFF_HEADER_SIZE: u64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiffHeader {
    pub chunk_size: u32,
    pub form: [u8; 4],
}

impl RiffHeader {
    /// Reads the header at `offset`, or `None` if there is no complete RIFF header.
    pub fn read<S: ByteSource + ?Sized>(source: &mut S, offset: u64) -> Result<Option<Self>> {
        let mut header = [0u8; RIFF_HEADER_SIZE as usize];
        if !source.try_read_exact_at(offset, &mut header)? || &header[..4] != RIFF_TAG {
            return Ok(None);
        }

        Ok(Some(Self {
            chunk_size: u32::from_le_bytes([header[4], header[5], header[6], header[7]]),
            form: [header[8], header[9], header[10], header[11]],
        }))
    }

    pub fn is_wave(&self) -> bool {
        &self.form == WAVE_FORM
    }

    /// Declared length of the whole file, header included.
    pub fn total_len(&self) -> u64 {
        self.chunk_size as u64 + RIFF_PREAMBLE_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::source::tests::memory;

    #[test]
    fn test_reads_declared_size() -> Result<()> {
        let mut source = memory(b"xxRIFF\x64\x00\x00\x00WAVEfmt ".to_vec());

        let header = RiffHeader::read(&mut source, 2)?.expect("riff header");
        assert!(header.is_wave());
        assert_eq!(header.total_len(), 108);

        assert_eq!(RiffHeader::read(&mut source, 0)?, None);
        Ok(())
    }

    #[test]
    fn test_other_forms_and_short_input() -> Result<()> {
        let mut source = memory(b"RIFF\xe8\x03\x00\x00AVI ".to_vec());
        let header = RiffHeader::read(&mut source, 0)?.expect("riff header");
        assert!(!header.is_wave());
        assert_eq!(header.total_len(), 1008);

        let mut short = memory(b"RIFF\x64\x00".to_vec());
        assert_eq!(RiffHeader::read(&mut short, 0)?, None);
        Ok(())
    }

    #[test]
    fn test_maximum_chunk_size_does_not_overflow() -> Result<()> {
        let mut source = memory(b"RIFF\xff\xff\xff\xffWAVE".to_vec());
        let header = RiffHeader::read(&mut source, 0)?.expect("riff header");
        assert_eq!(header.total_len(), u32::MAX as u64 + 8);
        Ok(())
    }
}
