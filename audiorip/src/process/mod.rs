/// Per-format stream validation.
///
/// Provides the [`FormatValidator`](validate::FormatValidator) trait and its
/// [`WavValidator`](validate::WavValidator), [`OggValidator`](validate::OggValidator)
/// and [`MpegValidator`](validate::MpegValidator) implementations.
pub mod validate;

/// Signature-driven scanning of a whole input for one format.
///
/// Provides [`scan`](scan::scan), which reports each [`Match`](validate::Match) to a
/// [`MatchSink`](scan::MatchSink).
pub mod scan;

/// Copying matched ranges into output files.
///
/// Provides the [`Extractor`](extract::Extractor) sink and the
/// [`ExtractionContext`](extract::ExtractionContext) it writes into.
pub mod extract;
