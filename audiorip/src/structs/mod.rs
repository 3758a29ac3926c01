//! Container and frame headers of the carved formats.
//!
//! These types decode the few header fields needed to bound a stream; audio content
//! itself is never decoded.

pub mod id3;
pub mod mpeg;
pub mod ogg;
pub mod riff;
