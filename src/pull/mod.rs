//! Pull source that republishes a remote HTTP-FLV stream.

use std::sync::Arc;
use std::time::Duration;
use futures::StreamExt;
use log::{debug, info, warn};
use url::Url;
use crate::amf::{Amf0Decoder, Amf0Value};
use crate::flv::{FlvHeader, FlvTag, FlvTagReader, FlvTagType, ON_METADATA};
use crate::media::{
    AacAudioConfig, AudioTagHeader, AudioTrackInfo, MediaFrame, VideoTagHeader, VideoTrackInfo,
};
use crate::pipeline::{Publisher, Puller};
use crate::{Error, Result};

pub struct HttpFlvPuller {
    client: reqwest::Client,
}

impl HttpFlvPuller {
    pub fn new(connect_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!("hdl-live/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpFlvPuller { client })
    }
}

#[async_trait::async_trait]
impl Puller for HttpFlvPuller {
    async fn pull(&self, url: Url, publisher: Arc<Publisher>) -> Result<()> {
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(Error::ingestion(format!("Unsupported pull scheme '{}'", other)));
            }
        }

        let response = self.client.get(url.clone()).send().await?.error_for_status()?;
        info!("{}: connected to {}", publisher.path(), url);

        let mut body = response.bytes_stream();
        let mut reader = FlvTagReader::new();
        let mut state = PullState::default();

        while let Some(chunk) = body.next().await {
            if publisher.tracks().closed {
                debug!("{}: publisher closed, stopping pull", publisher.path());
                return Ok(());
            }
            reader.push(&chunk?);
            while let Some(tag) = reader.next_tag()? {
                state.handle_tag(&publisher, reader.header(), tag).await;
            }
        }

        Ok(())
    }
}

/// What has been learned about the remote stream so far
#[derive(Default)]
struct PullState {
    width: u32,
    height: u32,
    video: Option<VideoTrackInfo>,
    audio: Option<AudioTrackInfo>,
    complete: bool,
}

impl PullState {
    async fn handle_tag(&mut self, publisher: &Publisher, header: Option<FlvHeader>, tag: FlvTag) {
        let result = match tag.tag_type {
            FlvTagType::Script => {
                self.handle_script(publisher, &tag);
                Ok(())
            }
            FlvTagType::Video => self.handle_video(publisher, tag).await,
            FlvTagType::Audio => self.handle_audio(publisher, tag).await,
        };
        if let Err(e) = result {
            warn!("{}: skipping malformed tag: {}", publisher.path(), e);
        }

        if !self.complete {
            if let Some(header) = header {
                let video_ready = !header.has_video || self.video.is_some();
                let audio_ready = !header.has_audio || self.audio.is_some();
                if video_ready && audio_ready {
                    self.complete = true;
                    publisher.mark_tracks_complete();
                }
            }
        }
    }

    fn handle_script(&mut self, publisher: &Publisher, tag: &FlvTag) {
        let values = match Amf0Decoder::new(&tag.data).decode_all() {
            Ok(values) => values,
            Err(e) => {
                debug!("{}: unreadable script tag: {}", publisher.path(), e);
                return;
            }
        };
        if values.first().and_then(Amf0Value::as_string) != Some(ON_METADATA) {
            return;
        }
        let Some(metadata) = values.get(1) else {
            return;
        };

        let number = |key: &str| {
            metadata
                .get_property(key)
                .and_then(Amf0Value::as_number)
                .map(|n| n as u32)
        };
        self.width = number("width").unwrap_or(self.width);
        self.height = number("height").unwrap_or(self.height);

        if let Some(video) = self.video.as_mut() {
            if video.width != self.width || video.height != self.height {
                video.width = self.width;
                video.height = self.height;
                publisher.set_video_track(video.clone());
            }
        }
    }

    async fn handle_video(&mut self, publisher: &Publisher, tag: FlvTag) -> Result<()> {
        let header = VideoTagHeader::parse(&tag.data)?;

        if header.is_sequence_header {
            let info = VideoTrackInfo::new(header.codec, self.width, self.height)
                .with_decoder_config(tag.data.clone());
            publisher.set_video_track(info.clone());
            // Subscribers already playing need the new configuration in-band
            if self.video.replace(info).is_some() {
                publisher.publish_video(MediaFrame::video(tag.timestamp, tag.data)).await;
            }
            return Ok(());
        }

        if self.video.is_none() {
            if header.codec.needs_decoder_config() {
                // Undecodable until the sequence header arrives
                return Ok(());
            }
            let info = VideoTrackInfo::new(header.codec, self.width, self.height);
            publisher.set_video_track(info.clone());
            self.video = Some(info);
        }

        publisher.publish_video(MediaFrame::video(tag.timestamp, tag.data)).await;
        Ok(())
    }

    async fn handle_audio(&mut self, publisher: &Publisher, tag: FlvTag) -> Result<()> {
        let header = AudioTagHeader::parse(&tag.data)?;

        if header.is_sequence_header {
            let config = AacAudioConfig::from_sequence_header(&tag.data)?;
            let sample_rate = config.sample_rate().unwrap_or(header.sound_rate.as_hz());
            let channels = if config.channel_config > 0 {
                config.channel_config
            } else {
                header.channels
            };
            let info = AudioTrackInfo::new(header.codec, sample_rate, header.sample_size, channels)
                .with_decoder_config(tag.data.clone());
            publisher.set_audio_track(info.clone());
            if self.audio.replace(info).is_some() {
                publisher.publish_audio(MediaFrame::audio(tag.timestamp, tag.data)).await;
            }
            return Ok(());
        }

        if self.audio.is_none() {
            if header.codec.needs_decoder_config() {
                return Ok(());
            }
            let info = AudioTrackInfo::new(
                header.codec,
                header.sound_rate.as_hz(),
                header.sample_size,
                header.channels,
            );
            publisher.set_audio_track(info.clone());
            self.audio = Some(info);
        }

        publisher.publish_audio(MediaFrame::audio(tag.timestamp, tag.data)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use bytes::Bytes;
    use crate::flv::script_payload;
    use crate::media::{AudioCodec, VideoCodec};
    use crate::pipeline::PublisherOrigin;

    fn tag(tag_type: FlvTagType, timestamp: u32, data: &[u8]) -> FlvTag {
        FlvTag {
            tag_type,
            timestamp,
            data: Bytes::copy_from_slice(data),
        }
    }

    #[tokio::test]
    async fn test_tracks_learned_from_tags() {
        let publisher = Publisher::new("p", PublisherOrigin::Push, 8);
        let header = Some(FlvHeader { has_video: true, has_audio: true });
        let mut state = PullState::default();

        let mut metadata = HashMap::new();
        metadata.insert("width".to_string(), Amf0Value::Number(1280.0));
        metadata.insert("height".to_string(), Amf0Value::Number(720.0));
        let script = script_payload(&metadata).unwrap();

        state.handle_tag(&publisher, header, tag(FlvTagType::Script, 0, &script)).await;
        state.handle_tag(&publisher, header, tag(FlvTagType::Video, 0, &[0x17, 0x00, 0x01])).await;
        assert!(!publisher.tracks().complete);
        state.handle_tag(&publisher, header, tag(FlvTagType::Audio, 0, &[0xAF, 0x00, 0x12, 0x10])).await;

        let tracks = publisher.tracks();
        assert!(tracks.complete);
        let video = tracks.video.unwrap();
        assert_eq!(video.codec, VideoCodec::H264);
        assert_eq!((video.width, video.height), (1280, 720));
        assert_eq!(&video.decoder_config[..], &[0x17, 0x00, 0x01]);

        let audio = tracks.audio.unwrap();
        assert_eq!(audio.codec, AudioCodec::AAC);
        assert_eq!(audio.sample_rate, 44100);
        assert_eq!(audio.channels, 2);
    }

    #[tokio::test]
    async fn test_avc_frames_before_sequence_header_skipped() {
        let publisher = Publisher::new("p", PublisherOrigin::Push, 8);
        let mut state = PullState::default();
        let header = Some(FlvHeader { has_video: true, has_audio: false });

        state.handle_tag(&publisher, header, tag(FlvTagType::Video, 0, &[0x27, 0x01])).await;
        assert!(publisher.tracks().video.is_none());
        assert!(!publisher.tracks().complete);
    }

    #[tokio::test]
    async fn test_mp3_announced_from_first_frame() {
        let publisher = Publisher::new("p", PublisherOrigin::Push, 8);
        let mut state = PullState::default();
        let header = Some(FlvHeader { has_video: false, has_audio: true });

        state.handle_tag(&publisher, header, tag(FlvTagType::Audio, 0, &[0x2E, 0xFF, 0xFB])).await;
        let tracks = publisher.tracks();
        let audio = tracks.audio.unwrap();
        assert_eq!(audio.codec, AudioCodec::MP3);
        assert_eq!(audio.sample_rate, 44100);
        assert!(audio.decoder_config.is_empty());
        assert!(tracks.complete);
    }

    #[tokio::test]
    async fn test_repeated_sequence_header_reaches_subscribers() {
        let publisher = Arc::new(Publisher::new("p", PublisherOrigin::Push, 8));
        let header = Some(FlvHeader { has_video: true, has_audio: false });
        let mut state = PullState::default();

        state.handle_tag(&publisher, header, tag(FlvTagType::Video, 0, &[0x17, 0x00, 0x01])).await;
        let mut sub = publisher.add_subscriber("t".into()).await;
        let (video, _) = sub.wait_tracks(Duration::from_millis(50)).await;
        let mut video = video.unwrap();
        sub.play().await;

        state.handle_tag(&publisher, header, tag(FlvTagType::Video, 40, &[0x27, 0x01])).await;
        state.handle_tag(&publisher, header, tag(FlvTagType::Video, 80, &[0x17, 0x00, 0x02])).await;

        assert_eq!(video.frames.recv().await.unwrap().timestamp, 40);
        let config = video.frames.recv().await.unwrap();
        assert_eq!(config.timestamp, 80);
        assert_eq!(&config.payload[..], &[0x17, 0x00, 0x02]);
        assert_eq!(
            &publisher.tracks().video.unwrap().decoder_config[..],
            &[0x17, 0x00, 0x02]
        );
    }

    #[tokio::test]
    async fn test_rejects_non_http_scheme() {
        let puller = HttpFlvPuller::new(Duration::from_secs(1)).unwrap();
        let publisher = Arc::new(Publisher::new("p", PublisherOrigin::Push, 8));
        let url = Url::parse("rtmp://example.com/live/a").unwrap();
        let err = puller.pull(url, publisher).await.unwrap_err();
        assert!(matches!(err, Error::Ingestion(_)));
    }
}
