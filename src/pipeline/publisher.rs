use std::sync::Arc;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::sync::{mpsc, watch, RwLock};
use uuid::Uuid;
use crate::media::{AudioTrackInfo, MediaFrame, MediaKind, VideoTrackInfo};
use crate::pipeline::subscription::{Subscription, SubscriberControl};
use crate::pipeline::{PublisherOrigin, StreamDescriptor};
use crate::utils::now_utc;

/// Tracks announced by a publisher
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackSet {
    pub video: Option<VideoTrackInfo>,
    pub audio: Option<AudioTrackInfo>,
    /// No further tracks will be announced
    pub complete: bool,
    /// Publisher has gone away
    pub closed: bool,
}

struct SubscriberHandle {
    /// Subscriber ID
    id: Uuid,

    /// Display name for logs
    name: String,

    video_tx: mpsc::Sender<MediaFrame>,
    audio_tx: mpsc::Sender<MediaFrame>,

    /// Frames are only delivered after play
    playing: bool,
}

impl SubscriberHandle {
    /// Both frame queues have been dropped by the subscriber
    fn is_gone(&self) -> bool {
        self.video_tx.is_closed() && self.audio_tx.is_closed()
    }
}

/// Live source of one stream path; owns its tracks and fans frames out.
pub struct Publisher {
    path: String,
    origin: PublisherOrigin,
    started_at: DateTime<Utc>,

    /// Announced tracks
    tracks: watch::Sender<TrackSet>,

    /// Subscribers
    subscribers: RwLock<Vec<SubscriberHandle>>,

    /// Per-subscriber queue bound; a full queue drops the subscriber
    queue_capacity: usize,
}

impl Publisher {
    pub fn new(path: impl Into<String>, origin: PublisherOrigin, queue_capacity: usize) -> Self {
        let (tracks, _) = watch::channel(TrackSet::default());
        Publisher {
            path: path.into(),
            origin,
            started_at: now_utc(),
            tracks,
            subscribers: RwLock::new(Vec::new()),
            queue_capacity: queue_capacity.max(1),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn origin(&self) -> &PublisherOrigin {
        &self.origin
    }

    /// Current track announcement
    pub fn tracks(&self) -> TrackSet {
        self.tracks.borrow().clone()
    }

    /// Announce or replace the video track
    pub fn set_video_track(&self, info: VideoTrackInfo) {
        debug!("{}: video track {} {}x{}", self.path, info.codec.name(), info.width, info.height);
        self.tracks.send_modify(|t| t.video = Some(info));
    }

    /// Announce or replace the audio track
    pub fn set_audio_track(&self, info: AudioTrackInfo) {
        debug!("{}: audio track {} {}Hz", self.path, info.codec.name(), info.sample_rate);
        self.tracks.send_modify(|t| t.audio = Some(info));
    }

    /// Declare that no further tracks will be announced
    pub fn mark_tracks_complete(&self) {
        self.tracks.send_modify(|t| t.complete = true);
    }

    pub async fn publish_video(&self, frame: MediaFrame) {
        self.distribute(MediaKind::Video, frame).await;
    }

    pub async fn publish_audio(&self, frame: MediaFrame) {
        self.distribute(MediaKind::Audio, frame).await;
    }

    /// Publish a frame on the track matching its kind
    pub async fn publish(&self, frame: MediaFrame) {
        self.distribute(frame.kind, frame).await;
    }

    /// Add subscriber; frames flow once [`Subscription::play`] is called
    pub(crate) async fn add_subscriber(self: &Arc<Self>, name: String) -> Subscription {
        let id = Uuid::new_v4();
        let (video_tx, video_rx) = mpsc::channel(self.queue_capacity);
        let (audio_tx, audio_rx) = mpsc::channel(self.queue_capacity);

        let mut subscribers = self.subscribers.write().await;
        subscribers.push(SubscriberHandle {
            id,
            name,
            video_tx,
            audio_tx,
            playing: false,
        });

        let control: Arc<dyn SubscriberControl> = self.clone();
        Subscription::new(
            id,
            self.path.clone(),
            self.tracks.subscribe(),
            video_rx,
            audio_rx,
            Arc::downgrade(&control),
        )
    }

    /// Get subscriber count
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Drop every subscriber and tell waiters the stream is gone
    pub async fn close(&self) {
        self.tracks.send_modify(|t| t.closed = true);
        let mut subscribers = self.subscribers.write().await;
        if !subscribers.is_empty() {
            info!("{}: closing {} subscriber(s)", self.path, subscribers.len());
        }
        subscribers.clear();
    }

    pub async fn descriptor(&self) -> StreamDescriptor {
        let tracks = self.tracks();
        StreamDescriptor {
            stream_path: self.path.clone(),
            origin: self.origin.clone(),
            has_video: tracks.video.is_some(),
            has_audio: tracks.audio.is_some(),
            subscribers: self.subscriber_count().await,
            started_at: self.started_at,
        }
    }

    /// Distribute frame to all playing subscribers without blocking
    async fn distribute(&self, kind: MediaKind, frame: MediaFrame) {
        {
            let tracks = self.tracks.borrow();
            let announced = match kind {
                MediaKind::Video => tracks.video.is_some(),
                MediaKind::Audio => tracks.audio.is_some(),
            };
            if !announced {
                return;
            }
        }

        let mut lagging = Vec::new();
        let mut detached = false;
        let subscribers = self.subscribers.read().await;

        for subscriber in subscribers.iter().filter(|s| s.playing) {
            let sender = match kind {
                MediaKind::Video => &subscriber.video_tx,
                MediaKind::Audio => &subscriber.audio_tx,
            };

            match sender.try_send(frame.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        "{}: subscriber {} is not keeping up, dropping it",
                        self.path, subscriber.name
                    );
                    lagging.push(subscriber.id);
                }
                // The subscriber did not take this track; its other track may still be live
                Err(mpsc::error::TrySendError::Closed(_)) => detached |= subscriber.is_gone(),
            }
        }

        // Remove failed subscribers
        if !lagging.is_empty() || detached {
            drop(subscribers);
            let mut subscribers = self.subscribers.write().await;
            subscribers.retain(|s| {
                let keep = !lagging.contains(&s.id) && !s.is_gone();
                if !keep && !lagging.contains(&s.id) {
                    debug!("{}: subscriber {} went away", self.path, s.name);
                }
                keep
            });
        }
    }
}

#[async_trait::async_trait]
impl SubscriberControl for Publisher {
    async fn play(&self, subscriber_id: Uuid) {
        let mut subscribers = self.subscribers.write().await;
        if let Some(subscriber) = subscribers.iter_mut().find(|s| s.id == subscriber_id) {
            subscriber.playing = true;
        }
    }

    async fn unsubscribe(&self, subscriber_id: Uuid) {
        let mut subscribers = self.subscribers.write().await;
        subscribers.retain(|s| s.id != subscriber_id);
    }
}
