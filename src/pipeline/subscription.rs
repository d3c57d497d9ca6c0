use std::fmt;
use std::sync::Weak;
use std::time::Duration;
use log::debug;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;
use crate::media::{AudioTrackInfo, MediaFrame, VideoTrackInfo};
use crate::pipeline::publisher::TrackSet;

/// Operations a subscription performs back on the pipeline that issued it
#[async_trait::async_trait]
pub trait SubscriberControl: Send + Sync {
    /// Start delivering frames to the subscriber
    async fn play(&self, subscriber_id: Uuid);

    /// Detach the subscriber; its frame queues close
    async fn unsubscribe(&self, subscriber_id: Uuid);
}

/// Video track bound to one subscriber
pub struct VideoTrack {
    pub info: VideoTrackInfo,
    pub frames: mpsc::Receiver<MediaFrame>,
}

/// Audio track bound to one subscriber
pub struct AudioTrack {
    pub info: AudioTrackInfo,
    pub frames: mpsc::Receiver<MediaFrame>,
}

/// A subscriber's attachment to one stream.
///
/// Holds only a weak reference to the pipeline side; the pipeline owns the
/// tracks and the subscriber list.
pub struct Subscription {
    id: Uuid,
    path: String,
    tracks: watch::Receiver<TrackSet>,
    video_rx: Option<mpsc::Receiver<MediaFrame>>,
    audio_rx: Option<mpsc::Receiver<MediaFrame>>,
    control: Weak<dyn SubscriberControl>,
    closed: bool,
}

impl Subscription {
    pub fn new(
        id: Uuid,
        path: String,
        tracks: watch::Receiver<TrackSet>,
        video_rx: mpsc::Receiver<MediaFrame>,
        audio_rx: mpsc::Receiver<MediaFrame>,
        control: Weak<dyn SubscriberControl>,
    ) -> Self {
        Subscription {
            id,
            path,
            tracks,
            video_rx: Some(video_rx),
            audio_rx: Some(audio_rx),
            control,
            closed: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Wait until a video track is announced, tracks are declared complete,
    /// the stream closes, or `timeout` elapses.
    pub async fn wait_video_track(&mut self, timeout: Duration) -> Option<VideoTrack> {
        let set = wait_for_track(self.tracks.clone(), timeout, |t| t.video.is_some()).await;
        let info = set.video?;
        let frames = self.video_rx.take()?;
        Some(VideoTrack { info, frames })
    }

    /// Audio counterpart of [`Subscription::wait_video_track`]
    pub async fn wait_audio_track(&mut self, timeout: Duration) -> Option<AudioTrack> {
        let set = wait_for_track(self.tracks.clone(), timeout, |t| t.audio.is_some()).await;
        let info = set.audio?;
        let frames = self.audio_rx.take()?;
        Some(AudioTrack { info, frames })
    }

    /// Wait for both tracks concurrently, each bounded by `timeout`
    pub async fn wait_tracks(&mut self, timeout: Duration) -> (Option<VideoTrack>, Option<AudioTrack>) {
        let (video_set, audio_set) = tokio::join!(
            wait_for_track(self.tracks.clone(), timeout, |t| t.video.is_some()),
            wait_for_track(self.tracks.clone(), timeout, |t| t.audio.is_some()),
        );

        let video = match (video_set.video, self.video_rx.take()) {
            (Some(info), Some(frames)) => Some(VideoTrack { info, frames }),
            _ => None,
        };
        let audio = match (audio_set.audio, self.audio_rx.take()) {
            (Some(info), Some(frames)) => Some(AudioTrack { info, frames }),
            _ => None,
        };
        (video, audio)
    }

    /// Resolves once the publisher has gone away
    pub async fn publisher_closed(&self) {
        let mut tracks = self.tracks.clone();
        // A dropped sender also means the publisher is gone
        let _ = tracks.wait_for(|t| t.closed).await;
    }

    /// Start frame delivery
    pub async fn play(&self) {
        if let Some(control) = self.control.upgrade() {
            control.play(self.id).await;
        }
    }

    /// Detach from the pipeline. Idempotent.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.video_rx = None;
        self.audio_rx = None;
        if let Some(control) = self.control.upgrade() {
            control.unsubscribe(self.id).await;
            debug!("{}: subscriber {} detached", self.path, self.id);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("closed", &self.closed)
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let Some(control) = self.control.upgrade() else {
            return;
        };
        // Dropped without close, e.g. when the request future is cancelled mid-wait
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let id = self.id;
            let path = std::mem::take(&mut self.path);
            handle.spawn(async move {
                control.unsubscribe(id).await;
                debug!("{}: subscriber {} detached on drop", path, id);
            });
        }
    }
}

async fn wait_for_track<F>(mut tracks: watch::Receiver<TrackSet>, timeout: Duration, present: F) -> TrackSet
where
    F: Fn(&TrackSet) -> bool,
{
    let ready = |t: &TrackSet| present(t) || t.complete || t.closed;
    // Timeout or a dropped sender both fall through to the latest snapshot
    let _ = tokio::time::timeout(timeout, tracks.wait_for(ready)).await;
    let snapshot = tracks.borrow().clone();
    snapshot
}
