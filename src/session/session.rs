use std::collections::HashMap;
use std::io;
use std::time::Duration;
use bytes::Bytes;
use log::{debug, error, info};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use crate::amf::Amf0Value;
use crate::flv::{build_metadata, write_flv_header, write_metadata_tag, write_tag, FlvTagType, TAG_HEADER_SIZE};
use crate::http::PathResolver;
use crate::media::{MediaFrame, MediaKind};
use crate::pipeline::{AudioTrack, MediaPipeline, SubscribeOptions, Subscription, VideoTrack};
use crate::utils::time_delta_ms;
use crate::{Error, Result};

/// Sending half of an HTTP response body
pub type BodySender = mpsc::Sender<io::Result<Bytes>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Resolving,
    Negotiating,
    Streaming,
    Closed,
}

/// Why a streaming session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Request context was cancelled
    Cancelled,
    /// Client went away or the body could not be written
    ClientGone,
    /// Every track queue ended
    StreamEnded,
}

/// Delivery of one stream to one HTTP client
pub struct FlvSession {
    path: String,
    subscriber: String,
    state: SessionState,
    subscription: Option<Subscription>,
    video: Option<VideoTrack>,
    audio: Option<AudioTrack>,
    metadata: HashMap<String, Amf0Value>,

    /// Bytes handed to the response body
    bytes_sent: u64,
    frames_sent: u64,
    first_timestamp: Option<u32>,
    last_timestamp: u32,
}

impl FlvSession {
    /// Resolve the request target into a session.
    ///
    /// Fails with a request error when the target names no stream.
    pub fn resolve(resolver: &PathResolver, target: &str, subscriber: impl Into<String>) -> Result<Self> {
        let path = resolver
            .resolve(target)
            .ok_or_else(|| Error::request(format!("No stream path in '{}'", target.escape_debug())))?;

        Ok(FlvSession {
            path,
            subscriber: subscriber.into(),
            state: SessionState::Negotiating,
            subscription: None,
            video: None,
            audio: None,
            metadata: HashMap::new(),
            bytes_sent: 0,
            frames_sent: 0,
            first_timestamp: None,
            last_timestamp: 0,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    /// Metadata sent in the `onMetaData` tag
    pub fn metadata(&self) -> &HashMap<String, Amf0Value> {
        &self.metadata
    }

    /// Subscribe to the stream, wait for its tracks and build the metadata
    pub async fn negotiate(&mut self, pipeline: &dyn MediaPipeline, wait_timeout: Duration) -> Result<()> {
        if self.state != SessionState::Negotiating {
            return Err(Error::stream(format!("Cannot negotiate in state {:?}", self.state)));
        }

        let options = SubscribeOptions {
            subscriber: self.subscriber.clone(),
            wait_timeout,
        };
        let mut subscription = match pipeline.subscribe(&self.path, &options).await {
            Ok(subscription) => subscription,
            Err(e) => {
                self.state = SessionState::Closed;
                return Err(e);
            }
        };

        let (video, audio) = subscription.wait_tracks(options.wait_timeout).await;
        self.metadata = build_metadata(
            video.as_ref().map(|t| &t.info),
            audio.as_ref().map(|t| &t.info),
        );
        debug!(
            "{}: negotiated for {} (video: {}, audio: {})",
            self.path,
            self.subscriber,
            video.is_some(),
            audio.is_some()
        );

        self.video = video;
        self.audio = audio;
        self.subscription = Some(subscription);
        Ok(())
    }

    /// Header, metadata tag and decoder-configuration tags as one chunk
    pub fn preamble(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(256);
        write_flv_header(&mut buf, self.has_video(), self.has_audio())?;
        write_metadata_tag(&mut buf, &self.metadata)?;

        if let Some(video) = self.video.as_ref().filter(|t| t.info.emits_decoder_config()) {
            write_tag(&mut buf, FlvTagType::Video, 0, &video.info.decoder_config)?;
        }
        if let Some(audio) = self.audio.as_ref().filter(|t| t.info.emits_decoder_config()) {
            write_tag(&mut buf, FlvTagType::Audio, 0, &audio.info.decoder_config)?;
        }
        Ok(buf)
    }

    /// Stream the preamble and then every frame into `body` until `cancel`
    /// fires, the client goes away or the tracks end. Always closes the session.
    pub async fn run(&mut self, body: BodySender, cancel: CancellationToken) -> Result<SessionEnd> {
        let result = self.stream(&body, &cancel).await;
        let result = match result {
            Err(e) if e.is_disconnect() => Ok(SessionEnd::ClientGone),
            other => other,
        };

        match &result {
            Ok(end) => self.close(&format!("{:?}", end)).await,
            Err(e) => {
                error!("{}: session for {} aborted: {}", self.path, self.subscriber, e);
                self.close("error").await;
            }
        }
        result
    }

    async fn stream(&mut self, body: &BodySender, cancel: &CancellationToken) -> Result<SessionEnd> {
        if self.state != SessionState::Negotiating || self.subscription.is_none() {
            return Err(Error::stream(format!("Cannot stream in state {:?}", self.state)));
        }

        let preamble = self.preamble()?;
        self.state = SessionState::Streaming;
        if let Some(end) = send_chunk(body, cancel, preamble.into(), &mut self.bytes_sent).await? {
            return Ok(end);
        }

        if let Some(subscription) = self.subscription.as_ref() {
            subscription.play().await;
        }
        info!("{}: streaming to {}", self.path, self.subscriber);

        let mut video_rx = self.video.as_mut().map(|t| &mut t.frames);
        let mut audio_rx = self.audio.as_mut().map(|t| &mut t.frames);

        if video_rx.is_none() && audio_rx.is_none() {
            // Nothing to forward; hold the response open until the stream or client ends
            let Some(subscription) = self.subscription.as_ref() else {
                return Ok(SessionEnd::StreamEnded);
            };
            return Ok(tokio::select! {
                _ = cancel.cancelled() => SessionEnd::Cancelled,
                _ = body.closed() => SessionEnd::ClientGone,
                _ = subscription.publisher_closed() => SessionEnd::StreamEnded,
            });
        }

        loop {
            let frame = tokio::select! {
                _ = cancel.cancelled() => return Ok(SessionEnd::Cancelled),
                _ = body.closed() => return Ok(SessionEnd::ClientGone),
                frame = next_frame(&mut video_rx, MediaKind::Video) => frame,
                frame = next_frame(&mut audio_rx, MediaKind::Audio) => frame,
            };

            let frame = match frame {
                Ok(frame) => frame,
                Err(kind) => {
                    debug!("{}: {:?} track ended", self.path, kind);
                    match kind {
                        MediaKind::Video => video_rx = None,
                        MediaKind::Audio => audio_rx = None,
                    }
                    if video_rx.is_none() && audio_rx.is_none() {
                        return Ok(SessionEnd::StreamEnded);
                    }
                    continue;
                }
            };

            let tag_type = match frame.kind {
                MediaKind::Video => FlvTagType::Video,
                MediaKind::Audio => FlvTagType::Audio,
            };
            let mut tag = Vec::with_capacity(TAG_HEADER_SIZE + frame.payload.len() + 4);
            write_tag(&mut tag, tag_type, frame.timestamp, &frame.payload)?;

            self.first_timestamp.get_or_insert(frame.timestamp);
            self.last_timestamp = frame.timestamp;
            self.frames_sent += 1;

            if let Some(end) = send_chunk(body, cancel, tag.into(), &mut self.bytes_sent).await? {
                return Ok(end);
            }
        }
    }

    /// Unsubscribe and log the outcome. Idempotent.
    pub async fn close(&mut self, reason: &str) {
        if self.state == SessionState::Closed && self.subscription.is_none() {
            return;
        }
        self.state = SessionState::Closed;
        self.video = None;
        self.audio = None;
        if let Some(mut subscription) = self.subscription.take() {
            subscription.close().await;
        }

        let media_ms = self
            .first_timestamp
            .map(|first| time_delta_ms(first, self.last_timestamp))
            .unwrap_or(0);
        info!(
            "{}: session for {} closed ({}): {} frames, {} bytes, {} ms of media",
            self.path, self.subscriber, reason, self.frames_sent, self.bytes_sent, media_ms
        );
    }
}

/// Push `chunk` into the body unless cancelled first
async fn send_chunk(
    body: &BodySender,
    cancel: &CancellationToken,
    chunk: Bytes,
    bytes_sent: &mut u64,
) -> Result<Option<SessionEnd>> {
    let len = chunk.len() as u64;
    tokio::select! {
        _ = cancel.cancelled() => Ok(Some(SessionEnd::Cancelled)),
        sent = body.send(Ok(chunk)) => {
            sent.map_err(|_| Error::connection_closed("Response body dropped"))?;
            *bytes_sent += len;
            Ok(None)
        }
    }
}

/// Next frame from an optional queue; pends forever on `None`.
/// A closed queue yields the kind of track that ended.
async fn next_frame(
    rx: &mut Option<&mut mpsc::Receiver<MediaFrame>>,
    kind: MediaKind,
) -> std::result::Result<MediaFrame, MediaKind> {
    match rx {
        Some(rx) => rx.recv().await.ok_or(kind),
        None => std::future::pending().await,
    }
}
