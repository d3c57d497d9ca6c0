//! Interface to the media pipeline that owns streams, tracks and subscribers,
//! plus [`StreamHub`], an in-process implementation of it.

use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;
use crate::Result;

mod hub;
mod publisher;
mod subscription;

pub use hub::{HubConfig, StreamHub};
pub use publisher::{Publisher, TrackSet};
pub use subscription::{AudioTrack, Subscription, SubscriberControl, VideoTrack};

#[derive(Debug, Clone)]
pub struct SubscribeOptions {
    /// Subscriber identity shown in logs (usually the client address)
    pub subscriber: String,
    /// Upper bound on waiting for tracks to be announced
    pub wait_timeout: Duration,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        SubscribeOptions {
            subscriber: "anonymous".to_string(),
            wait_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PublisherOrigin {
    /// Pushed into the pipeline by a local producer
    Push,
    /// Pulled from a remote URL
    Pull { url: String },
}

impl PublisherOrigin {
    pub fn is_pull(&self) -> bool {
        matches!(self, PublisherOrigin::Pull { .. })
    }
}

/// Snapshot of one registered stream
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamDescriptor {
    pub stream_path: String,
    pub origin: PublisherOrigin,
    pub has_video: bool,
    pub has_audio: bool,
    pub subscribers: usize,
    pub started_at: DateTime<Utc>,
}

/// Operations the HTTP-FLV core needs from the media pipeline
#[async_trait::async_trait]
pub trait MediaPipeline: Send + Sync {
    /// Whether a stream is currently published at `path`
    async fn resolve(&self, path: &str) -> bool;

    /// All registered streams
    async fn list_streams(&self) -> Vec<StreamDescriptor>;

    /// Attach a new subscriber; fails if the stream is absent or refuses it
    async fn subscribe(&self, path: &str, options: &SubscribeOptions) -> Result<Subscription>;

    /// Originate `path` by pulling from `remote_url`.
    ///
    /// Succeeds without side effects when the same pull is already active.
    async fn pull_stream(&self, path: &str, remote_url: &str) -> Result<()>;
}

/// Source that feeds a pull publisher from a remote URL until the remote ends
#[async_trait::async_trait]
pub trait Puller: Send + Sync {
    async fn pull(&self, url: Url, publisher: Arc<Publisher>) -> Result<()>;
}
