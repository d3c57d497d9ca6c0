use std::collections::HashMap;
use std::sync::Arc;
use log::{error, info, warn};
use tokio::sync::RwLock;
use url::Url;
use crate::pipeline::publisher::Publisher;
use crate::pipeline::subscription::Subscription;
use crate::pipeline::{
    MediaPipeline, PublisherOrigin, Puller, StreamDescriptor, SubscribeOptions,
};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Frames queued per subscriber and track before it is dropped
    pub queue_capacity: usize,

    /// Maximum subscribers per stream (0 = unlimited)
    pub max_subscribers: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        HubConfig {
            queue_capacity: 512,
            max_subscribers: 0,
        }
    }
}

type StreamMap = Arc<RwLock<HashMap<String, Arc<Publisher>>>>;

/// In-process stream registry implementing [`MediaPipeline`]
pub struct StreamHub {
    /// Publishers by stream path
    streams: StreamMap,

    config: HubConfig,

    /// Source used for pull publishers
    puller: Option<Arc<dyn Puller>>,
}

impl StreamHub {
    pub fn new(config: HubConfig) -> Self {
        StreamHub {
            streams: Arc::new(RwLock::new(HashMap::new())),
            config,
            puller: None,
        }
    }

    /// Use `puller` to originate streams requested through `pull_stream`
    pub fn with_puller(mut self, puller: Arc<dyn Puller>) -> Self {
        self.puller = Some(puller);
        self
    }

    /// Register a publisher for `path`
    pub async fn publish(&self, path: &str, origin: PublisherOrigin) -> Result<Arc<Publisher>> {
        let mut streams = self.streams.write().await;

        // Check if already publishing
        if streams.contains_key(path) {
            return Err(Error::stream(format!(
                "Stream '{}' is already being published",
                path
            )));
        }

        let publisher = Arc::new(Publisher::new(path, origin, self.config.queue_capacity));
        streams.insert(path.to_string(), publisher.clone());
        info!("Stream '{}' published", path);
        Ok(publisher)
    }

    /// Remove the publisher for `path` and end its subscribers
    pub async fn unpublish(&self, path: &str) -> Result<()> {
        let publisher = self
            .streams
            .write()
            .await
            .remove(path)
            .ok_or_else(|| Error::stream(format!("Stream '{}' not found", path)))?;
        publisher.close().await;
        info!("Stream '{}' unpublished", path);
        Ok(())
    }

    /// Get publisher
    pub async fn get(&self, path: &str) -> Option<Arc<Publisher>> {
        self.streams.read().await.get(path).cloned()
    }

    /// Number of registered streams
    pub async fn stream_count(&self) -> usize {
        self.streams.read().await.len()
    }

    fn spawn_puller(&self, puller: Arc<dyn Puller>, url: Url, publisher: Arc<Publisher>) {
        let streams = self.streams.clone();
        tokio::spawn(async move {
            let path = publisher.path().to_string();
            match puller.pull(url.clone(), publisher.clone()).await {
                Ok(()) => info!("Pull of '{}' from {} ended", path, url),
                Err(e) => error!("Pull of '{}' from {} failed: {}", path, url, e),
            }

            // Only remove the entry this task created
            let mut map = streams.write().await;
            if map.get(&path).is_some_and(|p| Arc::ptr_eq(p, &publisher)) {
                map.remove(&path);
            }
            drop(map);
            publisher.close().await;
        });
    }
}

#[async_trait::async_trait]
impl MediaPipeline for StreamHub {
    async fn resolve(&self, path: &str) -> bool {
        self.streams.read().await.contains_key(path)
    }

    async fn list_streams(&self) -> Vec<StreamDescriptor> {
        let publishers: Vec<Arc<Publisher>> = self.streams.read().await.values().cloned().collect();
        let mut descriptors = Vec::with_capacity(publishers.len());
        for publisher in publishers {
            descriptors.push(publisher.descriptor().await);
        }
        descriptors.sort_by(|a, b| a.stream_path.cmp(&b.stream_path));
        descriptors
    }

    async fn subscribe(&self, path: &str, options: &SubscribeOptions) -> Result<Subscription> {
        let publisher = self
            .get(path)
            .await
            .ok_or_else(|| Error::subscription(format!("Stream '{}' not found", path)))?;

        if self.config.max_subscribers > 0
            && publisher.subscriber_count().await >= self.config.max_subscribers
        {
            warn!("Stream '{}' rejected subscriber {}: limit reached", path, options.subscriber);
            return Err(Error::subscription(format!(
                "Stream '{}' has reached its subscriber limit",
                path
            )));
        }

        Ok(publisher.add_subscriber(options.subscriber.clone()).await)
    }

    async fn pull_stream(&self, path: &str, remote_url: &str) -> Result<()> {
        if path.is_empty() {
            return Err(Error::ingestion("Empty stream path"));
        }
        let url = Url::parse(remote_url)
            .map_err(|e| Error::ingestion(format!("Invalid pull URL '{}': {}", remote_url, e)))?;
        let puller = self
            .puller
            .clone()
            .ok_or_else(|| Error::ingestion("No pull source configured"))?;

        let origin = PublisherOrigin::Pull { url: url.to_string() };
        let publisher = {
            let mut streams = self.streams.write().await;
            if let Some(existing) = streams.get(path) {
                if existing.origin() == &origin {
                    info!("Stream '{}' is already pulling from {}", path, url);
                    return Ok(());
                }
                return Err(Error::ingestion(format!(
                    "Stream '{}' is already published by another source",
                    path
                )));
            }

            let publisher = Arc::new(Publisher::new(path, origin, self.config.queue_capacity));
            streams.insert(path.to_string(), publisher.clone());
            publisher
        };

        info!("Pulling '{}' from {}", path, url);
        self.spawn_puller(puller, url, publisher);
        Ok(())
    }
}
