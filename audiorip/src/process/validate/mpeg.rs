use anyhow::Result;
use log::{debug, trace};

use super::{AudioFormat, FormatValidator, Match, MpegStream, Signature, StreamKind};
use crate::structs::id3::{
    ID3V1_MARKER, ID3V1_TAG_SIZE, ID3V2_HEADER_SIZE, ID3V2_MARKER, Id3v2Header,
};
use crate::structs::mpeg::{FRAME_HEADER_SIZE, MpegFrameHeader, SYNC_BYTE, StreamIdentity};
use crate::utils::search::search_string;
use crate::utils::source::ByteSource;

/// Resume distance after a sync byte that does not start a stream.
pub const MPEG_REJECT_SKIP: u64 = 1;

/// Shortest frame chain accepted as a stream.
pub const MPEG_MIN_FRAMES: usize = 8;

/// How far before the first frame a leading ID3v2 tag is searched for.
pub const ID3V2_SEARCH_WINDOW: u64 = 2000;

/// Accepts runs of consecutive MPEG audio frames that agree on version, layer,
/// sample rate and channel mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct MpegValidator;

struct FrameChain {
    identity: StreamIdentity,
    frames: usize,
    length: u64,
}

impl MpegValidator {
    /// Follows frames from `start` until a header is invalid, a frame would run past
    /// the end of input, or the stream properties change.
    fn walk_frames(source: &mut dyn ByteSource, start: u64) -> Result<Option<FrameChain>> {
        let size = source.size();
        let mut chain: Option<FrameChain> = None;

        loop {
            let offset = start + chain.as_ref().map_or(0, |c| c.length);

            let mut bytes = [0u8; FRAME_HEADER_SIZE];
            if !source.try_read_exact_at(offset, &mut bytes)? {
                break;
            }
            let header = match MpegFrameHeader::parse(&bytes) {
                Ok(header) => header,
                Err(e) => {
                    trace!("Frame chain from {start} ends at {offset}: {e}");
                    break;
                }
            };

            let frame_size = header.frame_size() as u64;
            if offset + frame_size > size {
                trace!("Frame at {offset} ({frame_size} bytes) runs past end of input");
                break;
            }

            let identity = header.identity();
            match chain.as_mut() {
                None => {
                    chain = Some(FrameChain {
                        identity,
                        frames: 1,
                        length: frame_size,
                    })
                }
                Some(c) if c.identity == identity => {
                    c.frames += 1;
                    c.length += frame_size;
                }
                Some(c) => {
                    trace!(
                        "Stream properties change at {offset} after {} frames",
                        c.frames
                    );
                    break;
                }
            }
        }

        Ok(chain)
    }

    /// Start of a leading ID3v2 tag before `first_frame`, if one is found in the
    /// search window. The window never reaches below `floor`. Markers are tried
    /// nearest first, so a stray `ID3` in unrelated data further back does not hide
    /// the real tag.
    fn leading_id3v2(
        source: &mut dyn ByteSource,
        first_frame: u64,
        floor: u64,
    ) -> Result<Option<u64>> {
        let window_start = first_frame.saturating_sub(ID3V2_SEARCH_WINDOW).max(floor);
        let mut markers = Vec::new();
        let mut from = window_start;
        while from < first_frame {
            let Some(pos) = search_string(source, from, first_frame - from, ID3V2_MARKER)? else {
                break;
            };
            markers.push(pos);
            from = pos + 1;
        }

        for &tag_pos in markers.iter().rev() {
            if first_frame - tag_pos < ID3V2_HEADER_SIZE {
                debug!(
                    "ID3 marker at {tag_pos} overlaps the first frame at {first_frame}, ignored"
                );
                continue;
            }

            let mut header = [0u8; ID3V2_HEADER_SIZE as usize];
            source.read_exact_at(tag_pos, &mut header)?;
            let Some(tag) = Id3v2Header::parse(&header)? else {
                debug!("ID3 marker at {tag_pos} has no synchsafe size, ignored");
                continue;
            };

            debug!(
                "ID3v2.{}.{} tag at {tag_pos} ({} bytes declared) precedes MPEG stream at {first_frame}",
                tag.major,
                tag.revision,
                tag.total_len()
            );
            return Ok(Some(tag_pos));
        }

        Ok(None)
    }

    fn has_trailing_id3v1(source: &mut dyn ByteSource, offset: u64) -> Result<bool> {
        if !source.contains(offset, ID3V1_TAG_SIZE) {
            return Ok(false);
        }
        let mut marker = [0u8; 3];
        source.read_exact_at(offset, &mut marker)?;
        Ok(&marker == ID3V1_MARKER)
    }
}

impl FormatValidator for MpegValidator {
    fn format(&self) -> AudioFormat {
        AudioFormat::Mpeg
    }

    fn signature(&self) -> Signature {
        Signature::Byte(SYNC_BYTE)
    }

    fn reject_skip(&self) -> u64 {
        MPEG_REJECT_SKIP
    }

    fn try_match(
        &self,
        source: &mut dyn ByteSource,
        candidate: u64,
        floor: u64,
    ) -> Result<Option<Match>> {
        let Some(chain) = Self::walk_frames(source, candidate)? else {
            return Ok(None);
        };
        if chain.frames < MPEG_MIN_FRAMES {
            trace!(
                "Frame chain at {candidate} has only {} frames, rejected",
                chain.frames
            );
            return Ok(None);
        }

        let mut start = candidate;
        let mut length = chain.length;

        let id3v1 = Self::has_trailing_id3v1(source, candidate + length)?;
        if id3v1 {
            length += ID3V1_TAG_SIZE;
        }

        let mut id3v2_len = None;
        if let Some(tag_pos) = Self::leading_id3v2(source, candidate, floor)? {
            id3v2_len = Some(candidate - tag_pos);
            length += candidate - tag_pos;
            start = tag_pos;
        }

        Ok(Some(Match {
            start,
            length,
            kind: StreamKind::Mpeg(MpegStream {
                identity: chain.identity,
                frames: chain.frames,
                id3v1,
                id3v2_len,
            }),
        }))
    }
}
