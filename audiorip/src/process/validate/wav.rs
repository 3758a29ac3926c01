use anyhow::Result;
use log::{debug, warn};

use super::{AudioFormat, FormatValidator, Match, Signature, StreamKind};
use crate::structs::riff::{RIFF_TAG, RiffHeader};
use crate::utils::source::ByteSource;

/// Resume distance after a `RIFF` that is not a usable WAVE header.
pub const WAV_REJECT_SKIP: u64 = 4;

/// Accepts RIFF files of form type `WAVE`, sized by the RIFF chunk size.
#[derive(Debug, Default, Clone, Copy)]
pub struct WavValidator;

impl FormatValidator for WavValidator {
    fn format(&self) -> AudioFormat {
        AudioFormat::Wav
    }

    fn signature(&self) -> Signature {
        Signature::Pattern(RIFF_TAG)
    }

    fn reject_skip(&self) -> u64 {
        WAV_REJECT_SKIP
    }

    fn try_match(
        &self,
        source: &mut dyn ByteSource,
        candidate: u64,
        _floor: u64,
    ) -> Result<Option<Match>> {
        let Some(header) = RiffHeader::read(source, candidate)? else {
            debug!("RIFF at {candidate} has no complete header");
            return Ok(None);
        };
        if !header.is_wave() {
            debug!(
                "RIFF at {candidate} has form type {:?}, not WAVE",
                String::from_utf8_lossy(&header.form)
            );
            return Ok(None);
        }

        let declared_len = header.total_len();
        let available = source.size() - candidate;
        let length = if declared_len > available {
            warn!(
                "WAVE at {candidate} declares {declared_len} bytes but only {available} remain, truncating"
            );
            available
        } else {
            declared_len
        };

        Ok(Some(Match {
            start: candidate,
            length,
            kind: StreamKind::Wav { declared_len },
        }))
    }
}
