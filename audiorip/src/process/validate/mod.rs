//! Per-format stream validators.
//!
//! A [`FormatValidator`] names the signature that marks its candidates and decides,
//! for one candidate offset, whether a complete stream starts there and how long it
//! is. Rejections are ordinary control flow (`Ok(None)`); errors are reserved for
//! failed reads.

use std::fmt::{Display, Formatter};

use anyhow::Result;

use crate::structs::mpeg::StreamIdentity;
use crate::utils::source::ByteSource;

pub mod mpeg;
pub mod ogg;
pub mod wav;

pub use mpeg::MpegValidator;
pub use ogg::OggValidator;
pub use wav::WavValidator;

/// Audio formats the carver knows how to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AudioFormat {
    Wav,
    Ogg,
    Mpeg,
}

impl AudioFormat {
    /// Scan order used when every format is requested.
    pub const ALL: [AudioFormat; 3] = [AudioFormat::Wav, AudioFormat::Ogg, AudioFormat::Mpeg];

    /// Short label used in per-pass summaries.
    pub fn label(self) -> &'static str {
        match self {
            Self::Wav => ".wav",
            Self::Ogg => ".ogg",
            Self::Mpeg => "MPEG",
        }
    }

    pub fn validator(self) -> Box<dyn FormatValidator> {
        match self {
            Self::Wav => Box::new(WavValidator),
            Self::Ogg => Box::new(OggValidator),
            Self::Mpeg => Box::new(MpegValidator),
        }
    }
}

impl Display for AudioFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wav => write!(f, "MS Riff Wave"),
            Self::Ogg => write!(f, "Ogg Vorbis"),
            Self::Mpeg => write!(f, "MPEG audio"),
        }
    }
}

/// What a format scan searches for to produce candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    /// Exact byte string, searched with [`search_string`](crate::utils::search::search_string).
    Pattern(&'static [u8]),
    /// Single byte, searched with [`search_byte`](crate::utils::search::search_byte).
    Byte(u8),
}

/// Properties of an MPEG frame chain accepted as a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpegStream {
    pub identity: StreamIdentity,
    pub frames: usize,
    /// A trailing 128-byte ID3v1 tag is included.
    pub id3v1: bool,
    /// Bytes of a leading ID3v2 tag included before the first frame.
    pub id3v2_len: Option<u64>,
}

/// Format-specific classification of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Wav {
        /// Length announced by the RIFF header, which may run past the end of input.
        declared_len: u64,
    },
    Ogg {
        pages: usize,
        /// The chain ended with an end-of-stream page rather than at a truncation.
        terminated: bool,
    },
    Mpeg(MpegStream),
}

impl StreamKind {
    pub fn format(&self) -> AudioFormat {
        match self {
            Self::Wav { .. } => AudioFormat::Wav,
            Self::Ogg { .. } => AudioFormat::Ogg,
            Self::Mpeg(_) => AudioFormat::Mpeg,
        }
    }

    /// Extension of the artifact extracted for this stream.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav { .. } => ".wav",
            Self::Ogg { .. } => ".ogg",
            Self::Mpeg(stream) => stream.identity.extension(),
        }
    }
}

impl Display for StreamKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wav { declared_len } => write!(f, "RIFF WAVE, declared size: {declared_len}"),
            Self::Ogg { pages, terminated } => write!(
                f,
                "Ogg, pages: {pages}{}",
                if *terminated { "" } else { " (truncated)" }
            ),
            Self::Mpeg(stream) => {
                write!(
                    f,
                    "MPEG {}, layer {}, sample rate: {}, channel mode: {:#x}, frames: {}",
                    stream.identity.version,
                    stream.identity.layer,
                    stream.identity.sample_rate,
                    stream.identity.channel_mode.bits(),
                    stream.frames
                )?;
                if stream.id3v2_len.is_some() {
                    write!(f, ", ID3v2")?;
                }
                if stream.id3v1 {
                    write!(f, ", ID3v1")?;
                }
                Ok(())
            }
        }
    }
}

/// A validated byte range holding one stream.
///
/// `start + length` never exceeds the source size and `length` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub start: u64,
    pub length: u64,
    pub kind: StreamKind,
}

impl Match {
    pub fn end(&self) -> u64 {
        self.start + self.length
    }

    pub fn format(&self) -> AudioFormat {
        self.kind.format()
    }
}

/// Decides whether a candidate offset begins a complete stream of one format.
pub trait FormatValidator {
    fn format(&self) -> AudioFormat;

    fn signature(&self) -> Signature;

    /// Distance past a rejected candidate at which scanning resumes.
    fn reject_skip(&self) -> u64;

    /// Validates the stream starting at `candidate`, which the signature search has
    /// just reported. Returns the matched range, which may begin before `candidate`
    /// when a leading tag is attached, but never before `floor`, the end of the
    /// previous match of the same pass.
    fn try_match(
        &self,
        source: &mut dyn ByteSource,
        candidate: u64,
        floor: u64,
    ) -> Result<Option<Match>>;
}
