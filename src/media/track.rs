use bytes::Bytes;
use crate::media::audio::AudioCodec;
use crate::media::video::VideoCodec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}

/// One encoded frame as delivered by a publisher.
///
/// `payload` is a complete FLV audio/video tag body, starting with the
/// SoundFormat or FrameType/CodecID byte.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFrame {
    pub kind: MediaKind,
    /// Presentation time in milliseconds
    pub timestamp: u32,
    pub payload: Bytes,
}

impl MediaFrame {
    pub fn video(timestamp: u32, payload: impl Into<Bytes>) -> Self {
        MediaFrame {
            kind: MediaKind::Video,
            timestamp,
            payload: payload.into(),
        }
    }

    pub fn audio(timestamp: u32, payload: impl Into<Bytes>) -> Self {
        MediaFrame {
            kind: MediaKind::Audio,
            timestamp,
            payload: payload.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoTrackInfo {
    pub codec: VideoCodec,
    pub width: u32,
    pub height: u32,
    /// Sequence header tag body; empty when the codec has none
    pub decoder_config: Bytes,
}

impl VideoTrackInfo {
    pub fn new(codec: VideoCodec, width: u32, height: u32) -> Self {
        VideoTrackInfo {
            codec,
            width,
            height,
            decoder_config: Bytes::new(),
        }
    }

    pub fn with_decoder_config(mut self, config: impl Into<Bytes>) -> Self {
        self.decoder_config = config.into();
        self
    }

    /// Whether a decoder-configuration tag has to precede the first frame
    pub fn emits_decoder_config(&self) -> bool {
        self.codec.needs_decoder_config() && !self.decoder_config.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrackInfo {
    pub codec: AudioCodec,
    pub sample_rate: u32,
    pub sample_size: u8,
    pub channels: u8,
    /// Sequence header tag body; empty when the codec has none
    pub decoder_config: Bytes,
}

impl AudioTrackInfo {
    pub fn new(codec: AudioCodec, sample_rate: u32, sample_size: u8, channels: u8) -> Self {
        AudioTrackInfo {
            codec,
            sample_rate,
            sample_size,
            channels,
            decoder_config: Bytes::new(),
        }
    }

    pub fn with_decoder_config(mut self, config: impl Into<Bytes>) -> Self {
        self.decoder_config = config.into();
        self
    }

    /// Whether a decoder-configuration tag has to precede the first frame
    pub fn emits_decoder_config(&self) -> bool {
        self.codec.needs_decoder_config() && !self.decoder_config.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aac_without_config_emits_nothing() {
        let audio = AudioTrackInfo::new(AudioCodec::AAC, 44100, 16, 2);
        assert!(!audio.emits_decoder_config());
        let audio = audio.with_decoder_config(vec![0xAF, 0x00, 0x12, 0x10]);
        assert!(audio.emits_decoder_config());
    }

    #[test]
    fn test_mp3_never_emits_config() {
        let audio = AudioTrackInfo::new(AudioCodec::MP3, 44100, 16, 2)
            .with_decoder_config(vec![0x2F, 0x00]);
        assert!(!audio.emits_decoder_config());
    }

    #[test]
    fn test_avc_with_config() {
        let video = VideoTrackInfo::new(VideoCodec::H264, 1280, 720)
            .with_decoder_config(vec![0x17, 0x00, 0x00, 0x00, 0x00]);
        assert!(video.emits_decoder_config());
        assert_eq!(MediaFrame::video(40, vec![0x27]).kind, MediaKind::Video);
    }
}
