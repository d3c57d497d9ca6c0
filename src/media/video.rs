use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    /// Sorenson H.263
    H263,
    /// Screen video
    ScreenVideo,
    /// On2 VP6
    VP6,
    /// On2 VP6 with alpha
    VP6Alpha,
    /// Screen video v2
    ScreenVideo2,
    /// H.264 AVC
    H264,
    /// H.265 HEVC
    H265,
    /// AV1
    AV1,
    Unknown(u8),
}

impl VideoCodec {
    /// Parse from the FLV CodecID field
    pub fn from_codec_id(id: u8) -> Self {
        match id {
            2 => VideoCodec::H263,
            3 => VideoCodec::ScreenVideo,
            4 => VideoCodec::VP6,
            5 => VideoCodec::VP6Alpha,
            6 => VideoCodec::ScreenVideo2,
            7 => VideoCodec::H264,
            12 => VideoCodec::H265,
            13 => VideoCodec::AV1,
            _ => VideoCodec::Unknown(id),
        }
    }

    /// FLV CodecID value, also used as `videocodecid` in metadata
    pub fn codec_id(&self) -> u8 {
        match self {
            VideoCodec::H263 => 2,
            VideoCodec::ScreenVideo => 3,
            VideoCodec::VP6 => 4,
            VideoCodec::VP6Alpha => 5,
            VideoCodec::ScreenVideo2 => 6,
            VideoCodec::H264 => 7,
            VideoCodec::H265 => 12,
            VideoCodec::AV1 => 13,
            VideoCodec::Unknown(id) => *id,
        }
    }

    /// Codecs whose parameter sets travel in a sequence header tag
    pub fn needs_decoder_config(&self) -> bool {
        matches!(self, VideoCodec::H264 | VideoCodec::H265 | VideoCodec::AV1)
    }

    /// Get codec name
    pub fn name(&self) -> &str {
        match self {
            VideoCodec::H263 => "H.263",
            VideoCodec::ScreenVideo => "Screen",
            VideoCodec::VP6 => "VP6",
            VideoCodec::VP6Alpha => "VP6-Alpha",
            VideoCodec::ScreenVideo2 => "Screen-v2",
            VideoCodec::H264 => "H.264",
            VideoCodec::H265 => "H.265",
            VideoCodec::AV1 => "AV1",
            VideoCodec::Unknown(_) => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameType {
    /// Keyframe (I-frame)
    Keyframe,
    /// Inter-frame (P-frame)
    InterFrame,
    /// Disposable inter-frame
    DisposableInterFrame,
    /// Generated keyframe
    GeneratedKeyframe,
    /// Video info/command frame
    VideoInfo,
}

impl FrameType {
    pub fn from_bits(bits: u8) -> Self {
        match bits {
            1 => FrameType::Keyframe,
            3 => FrameType::DisposableInterFrame,
            4 => FrameType::GeneratedKeyframe,
            5 => FrameType::VideoInfo,
            _ => FrameType::InterFrame,
        }
    }

    pub fn is_keyframe(&self) -> bool {
        matches!(self, FrameType::Keyframe | FrameType::GeneratedKeyframe)
    }
}

/// First bytes of an FLV video tag body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoTagHeader {
    pub codec: VideoCodec,
    pub frame_type: FrameType,
    /// AVC/HEVC/AV1 packet type 0
    pub is_sequence_header: bool,
}

impl VideoTagHeader {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let tag_header = *payload
            .first()
            .ok_or_else(|| Error::stream("Empty video tag"))?;

        let frame_type = FrameType::from_bits((tag_header >> 4) & 0x0F);
        let codec = VideoCodec::from_codec_id(tag_header & 0x0F);
        let is_sequence_header = codec.needs_decoder_config() && payload.get(1) == Some(&0);

        Ok(VideoTagHeader {
            codec,
            frame_type,
            is_sequence_header,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_avc_sequence_header() {
        let header = VideoTagHeader::parse(&[0x17, 0x00, 0x00, 0x00, 0x00, 0x01]).unwrap();
        assert_eq!(header.codec, VideoCodec::H264);
        assert!(header.frame_type.is_keyframe());
        assert!(header.is_sequence_header);
    }

    #[test]
    fn test_parse_inter_frame() {
        let header = VideoTagHeader::parse(&[0x27, 0x01, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(header.frame_type, FrameType::InterFrame);
        assert!(!header.is_sequence_header);
    }

    #[test]
    fn test_h263_has_no_sequence_header() {
        let header = VideoTagHeader::parse(&[0x12, 0x00]).unwrap();
        assert_eq!(header.codec, VideoCodec::H263);
        assert!(!header.is_sequence_header);
        assert!(!header.codec.needs_decoder_config());
    }

    #[test]
    fn test_codec_id_round_trip() {
        for id in [2u8, 3, 4, 5, 6, 7, 12, 13, 9] {
            assert_eq!(VideoCodec::from_codec_id(id).codec_id(), id);
        }
    }
}
