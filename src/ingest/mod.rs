//! Requests that make the pipeline originate a stream from a remote URL.

use std::sync::Arc;
use log::{error, info, warn};
use tokio::sync::RwLock;
use crate::config::{ConfigStore, HdlConfig};
use crate::pipeline::MediaPipeline;
use crate::Result;

/// Outcome of replaying one saved pull
#[derive(Debug)]
pub struct PullReport {
    pub stream_path: String,
    pub url: String,
    pub result: Result<()>,
}

pub struct Ingestor {
    pipeline: Arc<dyn MediaPipeline>,
    config: Arc<RwLock<HdlConfig>>,
    store: Arc<dyn ConfigStore>,
}

impl Ingestor {
    pub fn new(
        pipeline: Arc<dyn MediaPipeline>,
        config: Arc<RwLock<HdlConfig>>,
        store: Arc<dyn ConfigStore>,
    ) -> Self {
        Ingestor { pipeline, config, store }
    }

    /// Originate `stream_path` from `url`.
    ///
    /// Repeating an active pull succeeds without a second publisher. With
    /// `save`, the mapping is persisted for replay on start; a failed save
    /// is logged and does not fail the pull.
    pub async fn pull(&self, stream_path: &str, url: &str, save: bool) -> Result<()> {
        self.pipeline.pull_stream(stream_path, url).await?;
        info!("Pull {} -> '{}' started", url, stream_path);

        if save {
            let snapshot = {
                let mut config = self.config.write().await;
                config
                    .pull
                    .auto_pull_list
                    .insert(stream_path.to_string(), url.to_string());
                config.clone()
            };
            let store = self.store.clone();
            match tokio::task::spawn_blocking(move || store.save(&snapshot)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Failed to save pull '{}': {}", stream_path, e),
                Err(e) => warn!("Save task for pull '{}' failed: {}", stream_path, e),
            }
        }
        Ok(())
    }

    /// Replay every saved pull; failures are reported per mapping
    pub async fn pull_on_start(&self) -> Vec<PullReport> {
        let mappings: Vec<(String, String)> = {
            let config = self.config.read().await;
            let mut mappings: Vec<_> = config
                .pull
                .auto_pull_list
                .iter()
                .map(|(path, url)| (path.clone(), url.clone()))
                .collect();
            mappings.sort();
            mappings
        };

        let mut reports = Vec::with_capacity(mappings.len());
        for (stream_path, url) in mappings {
            let result = self.pipeline.pull_stream(&stream_path, &url).await;
            if let Err(e) = &result {
                error!("Saved pull {} -> '{}' failed: {}", url, stream_path, e);
            }
            reports.push(PullReport { stream_path, url, result });
        }
        reports
    }
}
