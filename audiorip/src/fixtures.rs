//! Synthetic streams for tests.

use audiorip_macros::ToBytes;

use crate::byteorder::to_le;
use crate::structs::mpeg::{FRAME_HEADER_SIZE, MpegFrameHeader};
use crate::structs::ogg::{CAPTURE_PATTERN, FLAG_BOS, FLAG_EOS};

#[derive(ToBytes)]
struct RiffPreamble {
    tag: [u8; 4],
    chunk_size: u32,
    form: [u8; 4],
}

#[derive(ToBytes)]
struct OggPagePrefix {
    capture: [u8; 4],
    version: u8,
    flags: u8,
    granule: u64,
    serial: u32,
    sequence: u32,
    crc: u32,
    segment_count: u8,
}

#[derive(ToBytes)]
struct Id3v2Prefix {
    marker: [u8; 3],
    major: u8,
    revision: u8,
    flags: u8,
    size: [u8; 4],
}

/// Bytes that contain none of the signatures searched for.
pub fn filler(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 61) as u8 + 0x20).collect()
}

/// RIFF file with the given form type and `data_len` payload bytes.
pub fn riff(form: &[u8; 4], data_len: usize) -> Vec<u8> {
    let mut blob = to_le(&RiffPreamble {
        tag: *b"RIFF",
        chunk_size: (4 + data_len) as u32,
        form: *form,
    });
    blob.extend((0..data_len).map(|i| (i % 7) as u8));
    blob
}

/// Complete WAVE file of `data_len + 12` bytes.
pub fn wav(data_len: usize) -> Vec<u8> {
    riff(b"WAVE", data_len)
}

/// One Ogg page carrying `body_len` body bytes.
pub fn ogg_page(flags: u8, sequence: u32, body_len: usize) -> Vec<u8> {
    let mut lacing = vec![255u8; body_len / 255];
    lacing.push((body_len % 255) as u8);

    let mut page = to_le(&OggPagePrefix {
        capture: *CAPTURE_PATTERN,
        version: 0,
        flags,
        granule: sequence as u64 * 1024,
        serial: 0x1234_5678,
        sequence,
        crc: 0,
        segment_count: lacing.len() as u8,
    });
    page.extend_from_slice(&lacing);
    page.extend(std::iter::repeat_n(0x11, body_len));
    page
}

/// Ogg stream of `pages` pages: a 58-byte identification page, pages of varying
/// size and a final end-of-stream page. Returns the bytes and each page's size.
pub fn ogg_stream(pages: usize) -> (Vec<u8>, Vec<usize>) {
    assert!(pages >= 2);
    let mut blob = Vec::new();
    let mut sizes = Vec::new();

    for sequence in 0..pages {
        let page = match sequence {
            0 => ogg_page(FLAG_BOS, 0, 30),
            n if n == pages - 1 => ogg_page(FLAG_EOS, n as u32, 90),
            n => ogg_page(0, n as u32, 100 + n * 137),
        };
        sizes.push(page.len());
        blob.extend_from_slice(&page);
    }

    (blob, sizes)
}

/// `count` frames sharing one header, with zeroed payloads.
pub fn mpeg_frames(header: [u8; FRAME_HEADER_SIZE], count: usize) -> Vec<u8> {
    let size = frame_size(header);
    let mut blob = Vec::with_capacity(size * count);
    for _ in 0..count {
        blob.extend_from_slice(&header);
        blob.resize(blob.len() + size - FRAME_HEADER_SIZE, 0);
    }
    blob
}

pub fn frame_size(header: [u8; FRAME_HEADER_SIZE]) -> usize {
    MpegFrameHeader::parse(&header).unwrap().frame_size() as usize
}

/// ID3v2.3 tag with a synchsafe size field and `body_len` body bytes.
pub fn id3v2(body_len: usize) -> Vec<u8> {
    let size = [
        (body_len >> 21) as u8 & 0x7F,
        (body_len >> 14) as u8 & 0x7F,
        (body_len >> 7) as u8 & 0x7F,
        body_len as u8 & 0x7F,
    ];
    let mut tag = to_le(&Id3v2Prefix {
        marker: *b"ID3",
        major: 3,
        revision: 0,
        flags: 0,
        size,
    });
    tag.extend(std::iter::repeat_n(b'x', body_len));
    tag
}

/// 128-byte ID3v1 trailer.
pub fn id3v1() -> Vec<u8> {
    let mut tag = b"TAG".to_vec();
    tag.resize(128, b' ');
    tag
}
