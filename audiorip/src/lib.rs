#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! Scanning is done one format at a time. Each pass searches the input for the
//! format's signature, asks the format's validator whether a complete stream starts
//! at the candidate, and either hands the match to a sink or skips past the candidate.
//!
//! ### Signatures
//!
//! - **RIFF/WAVE**: `RIFF` with form type `WAVE` eight bytes later
//! - **Ogg**: `OggS` on a beginning-of-stream page, followed by a second page
//! - **MPEG audio**: `0xFF` starting a run of at least eight consistent frames
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use audiorip::process::extract::{ExtractMode, ExtractionContext, Extractor};
//! use audiorip::process::scan::scan;
//! use audiorip::process::validate::AudioFormat;
//! use audiorip::utils::source::FileSource;
//!
//! let mut source = FileSource::open("disk.img")?;
//! let mut context = ExtractionContext::new(".", "disk.img");
//!
//! for format in AudioFormat::ALL {
//!     let validator = format.validator();
//!     let mut extractor = Extractor::new(&mut context, ExtractMode::Extract);
//!     let stats = scan(&mut source, validator.as_ref(), &mut extractor)?;
//!     println!("{format}: {} streams", stats.matches);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

/// Scanning and extraction.
///
/// 1. **Validation** ([`process::validate`]): Per-format decision whether a stream
///    starts at a candidate offset, and how long it is.
///
/// 2. **Scanning** ([`process::scan`]): Drives one format's validator over the whole
///    input and reports matches to a sink.
///
/// 3. **Extraction** ([`process::extract`]): Copies matched ranges into numbered
///    files inside a per-run output directory.
pub mod process;

/// Header structures of the recognized formats.
///
/// - **RIFF** ([`structs::riff`]): RIFF/WAVE container header
/// - **Ogg** ([`structs::ogg`]): Ogg page header
/// - **MPEG** ([`structs::mpeg`]): MPEG audio frame header and tables
/// - **ID3** ([`structs::id3`]): ID3v1/ID3v2 tags around MPEG streams
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Byte Sources** ([`utils::source`]): Random-access input
/// - **Search** ([`utils::search`]): Block-buffered signature search
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level header reading
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;

#[cfg(test)]
mod byteorder;

#[cfg(test)]
mod fixtures;
