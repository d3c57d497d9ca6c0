mod config;
mod store;

pub use config::{HdlConfig, HdlConfigBuilder, PullConfig, SubscribeConfig};
pub use store::{ConfigStore, JsonConfigStore};
