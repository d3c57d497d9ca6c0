use bytes::Bytes;
use crate::{Error, Result};

/// Size of the fixed FLV file header (signature, version, flags, offset)
pub const FLV_HEADER_SIZE: usize = 9;
/// Size of every tag header
pub const TAG_HEADER_SIZE: usize = 11;
/// Largest payload a 24-bit DataSize can describe
pub const MAX_TAG_DATA_SIZE: usize = 0x00FF_FFFF;

pub const FLAG_VIDEO: u8 = 0x01;
pub const FLAG_AUDIO: u8 = 0x04;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlvTagType {
    Audio,
    Video,
    Script,
}

impl FlvTagType {
    pub fn as_u8(&self) -> u8 {
        match self {
            FlvTagType::Audio => 8,
            FlvTagType::Video => 9,
            FlvTagType::Script => 18,
        }
    }

    pub fn from_u8(value: u8) -> Result<Self> {
        // Upper bits carry the filter/reserved flags
        match value & 0x1F {
            8 => Ok(FlvTagType::Audio),
            9 => Ok(FlvTagType::Video),
            18 => Ok(FlvTagType::Script),
            other => Err(Error::stream(format!("Unknown FLV tag type: {}", other))),
        }
    }
}

/// A parsed FLV tag
#[derive(Debug, Clone, PartialEq)]
pub struct FlvTag {
    pub tag_type: FlvTagType,
    pub timestamp: u32,
    pub data: Bytes,
}

/// Flags byte of the FLV header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlvHeader {
    pub has_video: bool,
    pub has_audio: bool,
}

impl FlvHeader {
    pub fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.has_video {
            flags |= FLAG_VIDEO;
        }
        if self.has_audio {
            flags |= FLAG_AUDIO;
        }
        flags
    }

    pub fn from_flags(flags: u8) -> Self {
        FlvHeader {
            has_video: flags & FLAG_VIDEO != 0,
            has_audio: flags & FLAG_AUDIO != 0,
        }
    }
}
