use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    /// Linear PCM, platform endian
    PCM,
    /// ADPCM
    ADPCM,
    /// MP3
    MP3,
    /// Linear PCM, little endian
    PCMLittleEndian,
    /// Nellymoser 16kHz mono
    Nellymoser16kHz,
    /// Nellymoser 8kHz mono
    Nellymoser8kHz,
    /// Nellymoser
    Nellymoser,
    /// G.711 A-law
    G711ALaw,
    /// G.711 mu-law
    G711MuLaw,
    /// AAC
    AAC,
    /// Speex
    Speex,
    /// MP3 8kHz
    MP38kHz,
    /// Device specific
    DeviceSpecific,
    Unknown(u8),
}

impl AudioCodec {
    /// Parse from the FLV SoundFormat field
    pub fn from_sound_format(format: u8) -> Self {
        match format {
            0 => AudioCodec::PCM,
            1 => AudioCodec::ADPCM,
            2 => AudioCodec::MP3,
            3 => AudioCodec::PCMLittleEndian,
            4 => AudioCodec::Nellymoser16kHz,
            5 => AudioCodec::Nellymoser8kHz,
            6 => AudioCodec::Nellymoser,
            7 => AudioCodec::G711ALaw,
            8 => AudioCodec::G711MuLaw,
            10 => AudioCodec::AAC,
            11 => AudioCodec::Speex,
            14 => AudioCodec::MP38kHz,
            15 => AudioCodec::DeviceSpecific,
            other => AudioCodec::Unknown(other),
        }
    }

    /// FLV SoundFormat value, also used as `audiocodecid` in metadata
    pub fn sound_format(&self) -> u8 {
        match self {
            AudioCodec::PCM => 0,
            AudioCodec::ADPCM => 1,
            AudioCodec::MP3 => 2,
            AudioCodec::PCMLittleEndian => 3,
            AudioCodec::Nellymoser16kHz => 4,
            AudioCodec::Nellymoser8kHz => 5,
            AudioCodec::Nellymoser => 6,
            AudioCodec::G711ALaw => 7,
            AudioCodec::G711MuLaw => 8,
            AudioCodec::AAC => 10,
            AudioCodec::Speex => 11,
            AudioCodec::MP38kHz => 14,
            AudioCodec::DeviceSpecific => 15,
            AudioCodec::Unknown(v) => *v,
        }
    }

    /// Only AAC carries its configuration out of band
    pub fn needs_decoder_config(&self) -> bool {
        matches!(self, AudioCodec::AAC)
    }

    /// Get codec name
    pub fn name(&self) -> &str {
        match self {
            AudioCodec::PCM => "PCM",
            AudioCodec::ADPCM => "ADPCM",
            AudioCodec::MP3 => "MP3",
            AudioCodec::PCMLittleEndian => "PCM-LE",
            AudioCodec::Nellymoser16kHz => "Nellymoser-16kHz",
            AudioCodec::Nellymoser8kHz => "Nellymoser-8kHz",
            AudioCodec::Nellymoser => "Nellymoser",
            AudioCodec::G711ALaw => "G.711-A",
            AudioCodec::G711MuLaw => "G.711-mu",
            AudioCodec::AAC => "AAC",
            AudioCodec::Speex => "Speex",
            AudioCodec::MP38kHz => "MP3-8kHz",
            AudioCodec::DeviceSpecific => "Device",
            AudioCodec::Unknown(_) => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SoundRate {
    Rate5_5kHz,
    Rate11kHz,
    Rate22kHz,
    Rate44kHz,
}

impl SoundRate {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => SoundRate::Rate5_5kHz,
            1 => SoundRate::Rate11kHz,
            2 => SoundRate::Rate22kHz,
            _ => SoundRate::Rate44kHz,
        }
    }

    pub fn as_hz(&self) -> u32 {
        match self {
            SoundRate::Rate5_5kHz => 5512,
            SoundRate::Rate11kHz => 11025,
            SoundRate::Rate22kHz => 22050,
            SoundRate::Rate44kHz => 44100,
        }
    }
}

/// First byte of an FLV audio tag body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioTagHeader {
    pub codec: AudioCodec,
    pub sound_rate: SoundRate,
    /// 8 or 16
    pub sample_size: u8,
    /// 1 or 2
    pub channels: u8,
    /// AAC packet type 0
    pub is_sequence_header: bool,
}

impl AudioTagHeader {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let tag_header = *payload
            .first()
            .ok_or_else(|| Error::stream("Empty audio tag"))?;

        let codec = AudioCodec::from_sound_format((tag_header >> 4) & 0x0F);
        let sound_rate = SoundRate::from_bits((tag_header >> 2) & 0x03);
        let sample_size = if (tag_header >> 1) & 0x01 == 0 { 8 } else { 16 };
        let channels = if tag_header & 0x01 == 0 { 1 } else { 2 };
        let is_sequence_header = codec == AudioCodec::AAC && payload.get(1) == Some(&0);

        Ok(AudioTagHeader {
            codec,
            sound_rate,
            sample_size,
            channels,
            is_sequence_header,
        })
    }
}

/// AudioSpecificConfig (ISO 14496-3) fields
#[derive(Debug, Clone, PartialEq)]
pub struct AacAudioConfig {
    pub object_type: u8,
    pub sampling_index: u8,
    pub channel_config: u8,
}

const AAC_SAMPLE_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

impl AacAudioConfig {
    /// Parse from an AAC sequence header tag body (starting at the FLV audio tag header)
    pub fn from_sequence_header(payload: &[u8]) -> Result<Self> {
        if payload.len() < 4 {
            return Err(Error::stream("AAC config too short"));
        }
        let byte1 = payload[2];
        let byte2 = payload[3];

        Ok(AacAudioConfig {
            object_type: byte1 >> 3,
            sampling_index: ((byte1 & 0x07) << 1) | (byte2 >> 7),
            channel_config: (byte2 >> 3) & 0x0F,
        })
    }

    pub fn sample_rate(&self) -> Option<u32> {
        AAC_SAMPLE_RATES.get(self.sampling_index as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aac_tag_header() {
        // AAC, 44kHz, 16-bit, stereo, sequence header
        let header = AudioTagHeader::parse(&[0xAF, 0x00, 0x12, 0x10]).unwrap();
        assert_eq!(header.codec, AudioCodec::AAC);
        assert_eq!(header.sound_rate.as_hz(), 44100);
        assert_eq!(header.sample_size, 16);
        assert_eq!(header.channels, 2);
        assert!(header.is_sequence_header);

        let raw = AudioTagHeader::parse(&[0xAF, 0x01, 0x21]).unwrap();
        assert!(!raw.is_sequence_header);
    }

    #[test]
    fn test_parse_mp3_mono() {
        let header = AudioTagHeader::parse(&[0x2A, 0xFF]).unwrap();
        assert_eq!(header.codec, AudioCodec::MP3);
        assert_eq!(header.sample_size, 16);
        assert_eq!(header.channels, 1);
        assert!(!header.is_sequence_header);
        assert!(!header.codec.needs_decoder_config());
    }

    #[test]
    fn test_aac_specific_config() {
        // AAC-LC, 44100 Hz (index 4), 2 channels
        let config = AacAudioConfig::from_sequence_header(&[0xAF, 0x00, 0x12, 0x10]).unwrap();
        assert_eq!(config.object_type, 2);
        assert_eq!(config.sampling_index, 4);
        assert_eq!(config.channel_config, 2);
        assert_eq!(config.sample_rate(), Some(44100));
    }

    #[test]
    fn test_sound_format_round_trip() {
        for format in 0..16u8 {
            assert_eq!(AudioCodec::from_sound_format(format).sound_format(), format);
        }
    }

    #[test]
    fn test_empty_audio_tag() {
        assert!(AudioTagHeader::parse(&[]).is_err());
    }
}
