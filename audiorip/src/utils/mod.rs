//! Utility functions and supporting infrastructure.
//!
//! Provides the byte source abstraction, buffered pattern search, bit-level header
//! reading and error types.

pub mod bitstream_io;
pub mod errors;
pub mod search;
pub mod source;
