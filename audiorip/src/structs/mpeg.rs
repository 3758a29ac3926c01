//! MPEG audio frame headers and the lookup tables used to size frames.
//!
//! ## Header Layout
//!
//! Every frame starts with a 32-bit big-endian header:
//!
//! | bits | field                                   |
//! |------|-----------------------------------------|
//! | 11   | frame sync, all ones                    |
//! | 2    | version (`11` = 1, `10` = 2, `00` = 2.5) |
//! | 2    | layer (`11` = I, `10` = II, `01` = III) |
//! | 1    | protection (ignored)                    |
//! | 4    | bitrate index                           |
//! | 2    | sample rate index                       |
//! | 1    | padding                                 |
//! | 1    | private (ignored)                       |
//! | 2    | channel mode                            |
//!
//! The remaining bits (mode extension, copyright, original, emphasis) do not affect
//! the frame size and are not decoded.
//!
//! ## Frame Size
//!
//! Layer I frames are counted in 4-byte slots, layers II and III in bytes:
//!
//! - Layer I: `(spf / 32 * bitrate * 1000 / sample_rate + padding) * 4`
//! - Layer II/III: `spf / 8 * bitrate * 1000 / sample_rate + padding`
//!
//! All arithmetic is integer and evaluated left to right.

use std::fmt::{Display, Formatter};

use anyhow::Result;
use log::trace;

use crate::utils::bitstream_io::BsSliceReader;
use crate::utils::errors::FrameHeaderError;

/// Size of a frame header in bytes.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Byte that starts every frame sync.
pub const SYNC_BYTE: u8 = 0xFF;

/// MPEG audio version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MpegVersion {
    V1,
    V2,
    V2_5,
}

impl MpegVersion {
    fn from_bits(bits: u8) -> Result<Self, FrameHeaderError> {
        match bits {
            0b11 => Ok(Self::V1),
            0b10 => Ok(Self::V2),
            0b00 => Ok(Self::V2_5),
            _ => Err(FrameHeaderError::ReservedVersion),
        }
    }

    pub fn family(self) -> VersionFamily {
        match self {
            Self::V1 => VersionFamily::Mpeg1,
            Self::V2 | Self::V2_5 => VersionFamily::Mpeg2,
        }
    }
}

impl Display for MpegVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V1 => write!(f, "1"),
            Self::V2 => write!(f, "2"),
            Self::V2_5 => write!(f, "2.5"),
        }
    }
}

/// MPEG-2 and MPEG-2.5 share the low sample rate tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionFamily {
    Mpeg1,
    Mpeg2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    I,
    II,
    III,
}

impl Layer {
    fn from_bits(bits: u8) -> Result<Self, FrameHeaderError> {
        match bits {
            0b11 => Ok(Self::I),
            0b10 => Ok(Self::II),
            0b01 => Ok(Self::III),
            _ => Err(FrameHeaderError::ReservedLayer),
        }
    }
}

impl Display for Layer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::I => write!(f, "1"),
            Self::II => write!(f, "2"),
            Self::III => write!(f, "3"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelMode {
    Stereo,
    JointStereo,
    DualChannel,
    Mono,
}

impl ChannelMode {
    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Stereo,
            0b01 => Self::JointStereo,
            0b10 => Self::DualChannel,
            _ => Self::Mono,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Self::Stereo => 0b00,
            Self::JointStereo => 0b01,
            Self::DualChannel => 0b10,
            Self::Mono => 0b11,
        }
    }
}

/// Column of [`BITRATE_KBPS`] for a version/layer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum BitrateColumn {
    Mpeg1LayerI = 0,
    Mpeg1LayerII = 1,
    Mpeg1LayerIII = 2,
    Mpeg2LayerI = 3,
    Mpeg2LayerIIorIII = 4,
}

impl BitrateColumn {
    pub fn of(version: MpegVersion, layer: Layer) -> Self {
        match (version.family(), layer) {
            (VersionFamily::Mpeg1, Layer::I) => Self::Mpeg1LayerI,
            (VersionFamily::Mpeg1, Layer::II) => Self::Mpeg1LayerII,
            (VersionFamily::Mpeg1, Layer::III) => Self::Mpeg1LayerIII,
            (VersionFamily::Mpeg2, Layer::I) => Self::Mpeg2LayerI,
            (VersionFamily::Mpeg2, Layer::II | Layer::III) => Self::Mpeg2LayerIIorIII,
        }
    }
}

/// Bitrates in kbit/s, rows by bitrate index `0b0000..=0b1110`, columns by [`BitrateColumn`].
///
/// Row 0 is free format and row `0b1111` is invalid; neither is accepted by the header
/// decoder.
pub const BITRATE_KBPS: [[u16; 5]; 15] = [
    [0, 0, 0, 0, 0],
    [32, 32, 32, 32, 8],
    [64, 48, 40, 48, 16],
    [96, 56, 48, 56, 24],
    [128, 64, 56, 64, 32],
    [160, 80, 64, 80, 40],
    [192, 96, 80, 96, 48],
    [224, 112, 96, 112, 56],
    [256, 128, 112, 128, 64],
    [288, 160, 128, 144, 80],
    [320, 192, 160, 160, 96],
    [352, 224, 192, 176, 112],
    [384, 256, 224, 192, 128],
    [416, 320, 256, 224, 144],
    [448, 384, 320, 256, 160],
];

/// Sample rates in Hz by version (V1, V2, V2.5) and sample rate index `0b00..=0b10`.
pub const SAMPLE_RATE_HZ: [[u32; 3]; 3] = [
    [44100, 48000, 32000],
    [22050, 24000, 16000],
    [11025, 12000, 8000],
];

/// Samples per frame by layer (I, II, III) and version family (MPEG-1, MPEG-2/2.5).
pub const SAMPLES_PER_FRAME: [[u32; 2]; 3] = [[384, 384], [1152, 1152], [1152, 576]];

fn version_row(version: MpegVersion) -> usize {
    match version {
        MpegVersion::V1 => 0,
        MpegVersion::V2 => 1,
        MpegVersion::V2_5 => 2,
    }
}

fn layer_row(layer: Layer) -> usize {
    match layer {
        Layer::I => 0,
        Layer::II => 1,
        Layer::III => 2,
    }
}

fn family_column(family: VersionFamily) -> usize {
    match family {
        VersionFamily::Mpeg1 => 0,
        VersionFamily::Mpeg2 => 1,
    }
}

/// Properties that must stay constant across the frames of one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamIdentity {
    pub version: MpegVersion,
    pub layer: Layer,
    pub sample_rate: u32,
    pub channel_mode: ChannelMode,
}

impl StreamIdentity {
    /// File extension for an extracted stream with this identity.
    pub fn extension(&self) -> &'static str {
        match (self.version, self.layer) {
            (MpegVersion::V1, Layer::I) => ".mp1",
            (MpegVersion::V1, Layer::II) => ".mp2",
            (MpegVersion::V1, Layer::III) => ".mp3",
            _ => ".mpa",
        }
    }
}

/// Decoded MPEG audio frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpegFrameHeader {
    pub version: MpegVersion,
    pub layer: Layer,
    pub bitrate_index: u8,
    pub sample_rate_index: u8,
    pub padding: bool,
    pub channel_mode: ChannelMode,
}

impl MpegFrameHeader {
    /// Decodes the four header bytes of a frame candidate.
    pub fn parse(bytes: &[u8; FRAME_HEADER_SIZE]) -> Result<Self> {
        let reader = &mut BsSliceReader::from_slice(bytes);

        let sync: u16 = reader.get_n(11)?;
        if sync != 0x7FF {
            return Err(FrameHeaderError::NoSync.into());
        }

        let version = MpegVersion::from_bits(reader.get_n(2)?)?;
        let layer = Layer::from_bits(reader.get_n(2)?)?;
        let _protection = reader.get()?;

        let bitrate_index: u8 = reader.get_n(4)?;
        if bitrate_index == 0b0000 || bitrate_index == 0b1111 {
            return Err(FrameHeaderError::BadBitrateIndex(bitrate_index).into());
        }

        let sample_rate_index: u8 = reader.get_n(2)?;
        if sample_rate_index == 0b11 {
            return Err(FrameHeaderError::ReservedSampleRate.into());
        }

        let padding = reader.get()?;
        let _private = reader.get()?;
        let channel_mode = ChannelMode::from_bits(reader.get_n(2)?);

        let header = Self {
            version,
            layer,
            bitrate_index,
            sample_rate_index,
            padding,
            channel_mode,
        };
        trace!(
            "MPEG {} layer {}: {} kbps, {} Hz, padding {}, frame size {}",
            header.version,
            header.layer,
            header.bitrate_kbps(),
            header.sample_rate(),
            header.padding,
            header.frame_size()
        );

        Ok(header)
    }

    pub fn bitrate_kbps(&self) -> u32 {
        let column = BitrateColumn::of(self.version, self.layer) as usize;
        BITRATE_KBPS[self.bitrate_index as usize][column] as u32
    }

    pub fn sample_rate(&self) -> u32 {
        SAMPLE_RATE_HZ[version_row(self.version)][self.sample_rate_index as usize]
    }

    pub fn samples_per_frame(&self) -> u32 {
        SAMPLES_PER_FRAME[layer_row(self.layer)][family_column(self.version.family())]
    }

    /// Frame length in bytes, header included.
    pub fn frame_size(&self) -> u32 {
        let spf = self.samples_per_frame();
        let bitrate = self.bitrate_kbps() * 1000;
        let sample_rate = self.sample_rate();
        let padding = self.padding as u32;

        match self.layer {
            Layer::I => (spf / 32 * bitrate / sample_rate + padding) * 4,
            Layer::II | Layer::III => spf / 8 * bitrate / sample_rate + padding,
        }
    }

    pub fn identity(&self) -> StreamIdentity {
        StreamIdentity {
            version: self.version,
            layer: self.layer,
            sample_rate: self.sample_rate(),
            channel_mode: self.channel_mode,
        }
    }
}

/// Packs header fields into the four header bytes of a synthetic frame.
#[cfg(test)]
pub(crate) fn header_bytes(
    version_bits: u8,
    layer_bits: u8,
    bitrate_index: u8,
    sample_rate_index: u8,
    padding: bool,
    channel_mode_bits: u8,
) -> [u8; FRAME_HEADER_SIZE] {
    let word: u32 = (0x7FF << 21)
        | ((version_bits as u32 & 0b11) << 19)
        | ((layer_bits as u32 & 0b11) << 17)
        | (1 << 16)
        | ((bitrate_index as u32 & 0xF) << 12)
        | ((sample_rate_index as u32 & 0b11) << 10)
        | ((padding as u32) << 9)
        | ((channel_mode_bits as u32 & 0b11) << 6);
    word.to_be_bytes()
}
