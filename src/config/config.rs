use std::collections::HashMap;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::pipeline::HubConfig;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubscribeConfig {
    /// Upper bound on waiting for each track to be announced
    pub wait_timeout_ms: u64,

    /// Frames queued per subscriber and track
    pub queue_capacity: usize,

    /// Maximum subscribers per stream (0 = unlimited)
    pub max_subscribers: usize,
}

impl Default for SubscribeConfig {
    fn default() -> Self {
        SubscribeConfig {
            wait_timeout_ms: 5000,
            queue_capacity: 512,
            max_subscribers: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PullConfig {
    /// Replay `auto_pull_list` when the server starts
    pub pull_on_start: bool,

    /// Stream path to remote URL
    pub auto_pull_list: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HdlConfig {
    /// Address to bind
    pub listen_addr: String,

    /// Optional first path segment of stream URLs
    pub path_prefix: String,

    pub subscribe: SubscribeConfig,

    /// Chunks buffered in each HTTP response body
    pub response_buffer: usize,

    /// Lifetime of the cached `/list` response
    pub list_cache_ttl_ms: u64,

    /// Connect timeout for remote pulls
    pub pull_connect_timeout_ms: u64,

    pub pull: PullConfig,
}

impl Default for HdlConfig {
    fn default() -> Self {
        HdlConfig {
            listen_addr: "0.0.0.0:8080".to_string(),
            path_prefix: "hdl".to_string(),
            subscribe: SubscribeConfig::default(),
            response_buffer: 64,
            list_cache_ttl_ms: 1000,
            pull_connect_timeout_ms: 10_000,
            pull: PullConfig::default(),
        }
    }
}

impl HdlConfig {
    /// Create config builder
    pub fn builder() -> HdlConfigBuilder {
        HdlConfigBuilder::new()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.is_empty() {
            return Err(Error::config("Empty listen address"));
        }

        if self.path_prefix.contains('/') {
            return Err(Error::config(format!(
                "Path prefix '{}' must be a single segment",
                self.path_prefix
            )));
        }

        if self.subscribe.queue_capacity == 0 {
            return Err(Error::config("Invalid queue_capacity: 0"));
        }

        if self.response_buffer == 0 {
            return Err(Error::config("Invalid response_buffer: 0"));
        }

        for (path, url) in &self.pull.auto_pull_list {
            if path.is_empty() {
                return Err(Error::config(format!("Empty stream path for pull {}", url)));
            }
        }

        Ok(())
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.subscribe.wait_timeout_ms)
    }

    pub fn list_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.list_cache_ttl_ms)
    }

    pub fn pull_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.pull_connect_timeout_ms)
    }

    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            queue_capacity: self.subscribe.queue_capacity,
            max_subscribers: self.subscribe.max_subscribers,
        }
    }
}

/// Builder for HdlConfig
pub struct HdlConfigBuilder {
    config: HdlConfig,
}

impl HdlConfigBuilder {
    pub fn new() -> Self {
        HdlConfigBuilder {
            config: HdlConfig::default(),
        }
    }

    /// Set listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set stream path prefix
    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.path_prefix = prefix.into();
        self
    }

    /// Set track wait timeout
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.config.subscribe.wait_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set per-subscriber queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.subscribe.queue_capacity = capacity;
        self
    }

    pub fn max_subscribers(mut self, max: usize) -> Self {
        self.config.subscribe.max_subscribers = max;
        self
    }

    pub fn list_cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.list_cache_ttl_ms = ttl.as_millis() as u64;
        self
    }

    /// Replay saved pulls on start
    pub fn pull_on_start(mut self, enabled: bool) -> Self {
        self.config.pull.pull_on_start = enabled;
        self
    }

    /// Add a saved pull
    pub fn auto_pull(mut self, path: impl Into<String>, url: impl Into<String>) -> Self {
        self.config.pull.auto_pull_list.insert(path.into(), url.into());
        self
    }

    /// Build configuration
    pub fn build(self) -> Result<HdlConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for HdlConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HdlConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.path_prefix, "hdl");
        assert_eq!(config.wait_timeout(), Duration::from_secs(5));
        assert_eq!(config.list_cache_ttl(), Duration::from_secs(1));
    }

    #[test]
    fn test_builder_validates() {
        assert!(HdlConfig::builder().queue_capacity(0).build().is_err());
        assert!(HdlConfig::builder().path_prefix("a/b").build().is_err());

        let config = HdlConfig::builder()
            .listen_addr("127.0.0.1:9000")
            .auto_pull("camA", "http://example.com/a.flv")
            .build()
            .unwrap();
        assert_eq!(config.pull.auto_pull_list.len(), 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: HdlConfig =
            serde_json::from_str(r#"{"pathPrefix":"live","subscribe":{"maxSubscribers":3}}"#).unwrap();
        assert_eq!(config.path_prefix, "live");
        assert_eq!(config.subscribe.max_subscribers, 3);
        assert_eq!(config.subscribe.queue_capacity, 512);
        assert_eq!(config.response_buffer, 64);
    }
}
