use std::path::{Path, PathBuf};
use log::{debug, info};
use crate::config::HdlConfig;
use crate::Result;

/// Persistence of the plugin configuration
pub trait ConfigStore: Send + Sync {
    fn save(&self, config: &HdlConfig) -> Result<()>;
}

/// Stores the configuration as pretty-printed JSON at a file path
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonConfigStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration; a missing file yields the defaults
    pub fn load(&self) -> Result<HdlConfig> {
        if !self.path.exists() {
            info!("No config at {}, using defaults", self.path.display());
            return Ok(HdlConfig::default());
        }
        let data = std::fs::read(&self.path)?;
        let config: HdlConfig = serde_json::from_slice(&data)?;
        config.validate()?;
        debug!("Loaded config from {}", self.path.display());
        Ok(config)
    }
}

impl ConfigStore for JsonConfigStore {
    fn save(&self, config: &HdlConfig) -> Result<()> {
        let data = serde_json::to_vec_pretty(config)?;
        // Write then rename
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!("Saved config to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonConfigStore::new(dir.path().join("hdl.json"));
        assert_eq!(store.load().unwrap(), HdlConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonConfigStore::new(dir.path().join("hdl.json"));

        let config = HdlConfig::builder()
            .pull_on_start(true)
            .auto_pull("camA", "http://example.com/a.flv")
            .build()
            .unwrap();
        store.save(&config).unwrap();

        let loaded = store.load().unwrap();
        assert!(loaded.pull.pull_on_start);
        assert_eq!(
            loaded.pull.auto_pull_list.get("camA").map(String::as_str),
            Some("http://example.com/a.flv")
        );
    }

    #[test]
    fn test_invalid_json_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hdl.json");
        std::fs::write(&path, b"{ not json").unwrap();
        assert!(JsonConfigStore::new(path).load().is_err());
    }
}
