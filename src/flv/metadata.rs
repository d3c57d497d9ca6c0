use std::collections::HashMap;
use crate::amf::Amf0Value;
use crate::media::{AudioTrackInfo, VideoTrackInfo};

/// Creator tag written into every metadata object
pub const METADATA_CREATOR: &str = concat!("hdl-live ", env!("CARGO_PKG_VERSION"));

/// Build the `onMetaData` object for a session.
///
/// Duration, frame rate, data rate and file size are not known for a live
/// stream and are written as zero.
pub fn build_metadata(
    video: Option<&VideoTrackInfo>,
    audio: Option<&AudioTrackInfo>,
) -> HashMap<String, Amf0Value> {
    let mut metadata = HashMap::new();
    let mut set = |key: &str, value: Amf0Value| {
        metadata.insert(key.to_string(), value);
    };

    set("MetaDataCreator", METADATA_CREATOR.into());
    set("hasVideo", video.is_some().into());
    set("hasAudio", audio.is_some().into());
    set("hasMetadata", true.into());
    set("canSeekToEnd", false.into());
    set("duration", 0u32.into());
    set("hasKeyFrames", 0u32.into());
    set("framerate", 0u32.into());
    set("videodatarate", 0u32.into());
    set("filesize", 0u32.into());

    if let Some(video) = video {
        set("videocodecid", video.codec.codec_id().into());
        set("width", video.width.into());
        set("height", video.height.into());
    }

    if let Some(audio) = audio {
        set("audiocodecid", audio.codec.sound_format().into());
        set("audiosamplerate", audio.sample_rate.into());
        set("audiosamplesize", audio.sample_size.into());
        set("stereo", (audio.channels == 2).into());
    }

    metadata
}
