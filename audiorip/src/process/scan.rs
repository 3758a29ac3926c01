use anyhow::Result;
use log::{debug, info};

use crate::process::validate::{FormatValidator, Match, Signature};
use crate::utils::search::{search_byte, search_string};
use crate::utils::source::ByteSource;

/// Receives the matches of a scan pass in ascending offset order.
pub trait MatchSink {
    /// Handles one match. An error aborts the pass.
    fn accept(&mut self, source: &mut dyn ByteSource, found: &Match) -> Result<()>;

    /// Called after every candidate with the offset scanning resumes at.
    fn progress(&mut self, _position: u64) {}
}

/// Collects matches without acting on them.
impl MatchSink for Vec<Match> {
    fn accept(&mut self, _source: &mut dyn ByteSource, found: &Match) -> Result<()> {
        self.push(*found);
        Ok(())
    }
}

/// Counters of one scan pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub candidates: u64,
    pub rejected: u64,
    pub matches: u64,
    pub bytes_matched: u64,
}

/// Scans the whole source for streams of one format.
///
/// Candidates come from the validator's signature. After a match, scanning resumes
/// at the end of the matched range; after a rejection, at the candidate plus the
/// validator's reject skip. A leading tag may pull a match start back before its
/// candidate, but never into the previous match, so matches never overlap and are
/// reported in ascending order.
pub fn scan<V, K>(source: &mut dyn ByteSource, validator: &V, sink: &mut K) -> Result<ScanStats>
where
    V: FormatValidator + ?Sized,
    K: MatchSink + ?Sized,
{
    let size = source.size();
    let format = validator.format();
    let mut stats = ScanStats::default();
    let mut position = 0u64;
    let mut floor = 0u64;

    info!("Searching for {format}...");

    while position < size {
        let remaining = size - position;
        let candidate = match validator.signature() {
            Signature::Pattern(needle) => search_string(source, position, remaining, needle)?,
            Signature::Byte(byte) => search_byte(source, position, remaining, byte)?,
        };
        let Some(candidate) = candidate else {
            break;
        };
        stats.candidates += 1;

        match validator.try_match(source, candidate, floor)? {
            Some(found) => {
                info!(
                    "{format} at position {}, bytes: {} ({})",
                    found.start, found.length, found.kind
                );
                sink.accept(source, &found)?;

                stats.matches += 1;
                stats.bytes_matched += found.length;
                position = found.end();
                floor = position;
            }
            None => {
                stats.rejected += 1;
                position = candidate + validator.reject_skip();
            }
        }

        sink.progress(position.min(size));
    }

    debug!(
        "{format}: {} candidates, {} rejected, {} matches, {} bytes",
        stats.candidates, stats.rejected, stats.matches, stats.bytes_matched
    );

    Ok(stats)
}
