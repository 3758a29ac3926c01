use anyhow::Result;
use log::{debug, trace, warn};

use super::{AudioFormat, FormatValidator, Match, Signature, StreamKind};
use crate::structs::ogg::{
    CAPTURE_PATTERN, FIRST_PAGE_SIZE, FLAG_BOS, FLAG_EOS, FLAGS_OFFSET, MIN_PAGE_SIZE,
    OggPageHeader,
};
use crate::utils::source::ByteSource;

/// Resume distance after an `OggS` that does not start a usable stream.
pub const OGG_REJECT_SKIP: u64 = 4;

/// Accepts Ogg bitstreams from a beginning-of-stream page up to the end-of-stream
/// page, or up to the last page that fits in the input.
#[derive(Debug, Default, Clone, Copy)]
pub struct OggValidator;

impl FormatValidator for OggValidator {
    fn format(&self) -> AudioFormat {
        AudioFormat::Ogg
    }

    fn signature(&self) -> Signature {
        Signature::Pattern(CAPTURE_PATTERN)
    }

    fn reject_skip(&self) -> u64 {
        OGG_REJECT_SKIP
    }

    fn try_match(
        &self,
        source: &mut dyn ByteSource,
        candidate: u64,
        _floor: u64,
    ) -> Result<Option<Match>> {
        let size = source.size();

        // Room for the identification page and the header of a second page.
        if candidate + FIRST_PAGE_SIZE + MIN_PAGE_SIZE > size {
            debug!("OggS at {candidate} too close to end of input");
            return Ok(None);
        }

        let Some(mut flags) = source.byte_at(candidate + FLAGS_OFFSET)? else {
            return Ok(None);
        };
        if flags & FLAG_BOS == 0 {
            debug!("OggS at {candidate} is not a beginning-of-stream page");
            return Ok(None);
        }

        let mut second = [0u8; 4];
        source.read_exact_at(candidate + FIRST_PAGE_SIZE, &mut second)?;
        if &second != CAPTURE_PATTERN {
            debug!("OggS at {candidate} is not followed by a second page");
            return Ok(None);
        }

        let mut length = 0u64;
        let mut pages = 0usize;
        let mut terminated = false;

        while flags & FLAG_EOS == 0 {
            let offset = candidate + length;
            let Some(page) = OggPageHeader::read(source, offset)? else {
                trace!("No page at {offset}, Ogg stream at {candidate} ends");
                break;
            };

            flags = page.flags;
            if offset + page.page_size > size {
                trace!(
                    "Page {} at {offset} runs past end of input ({} bytes)",
                    page.sequence, page.page_size
                );
                break;
            }

            length += page.page_size;
            pages += 1;
            terminated = page.is_last();
            trace!(
                "Ogg page {} at {offset}: {} segments, {} bytes, flags {:#04x}",
                page.sequence, page.segment_count, page.page_size, page.flags
            );

            if candidate + length + MIN_PAGE_SIZE > size {
                break;
            }
        }

        if length == 0 {
            return Ok(None);
        }
        if !terminated {
            warn!("Ogg stream at {candidate} has no end-of-stream page, keeping {pages} pages");
        }

        Ok(Some(Match {
            start: candidate,
            length,
            kind: StreamKind::Ogg { pages, terminated },
        }))
    }
}
