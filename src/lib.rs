mod utils;
mod amf;
mod flv;
mod media;

pub mod config;
pub mod http;
pub mod ingest;
pub mod pipeline;
pub mod pull;
pub mod session;

// Re-export commonly used types at crate root
pub use utils::*;
pub use amf::*;
pub use flv::*;
pub use media::*;

pub use config::{ConfigStore, HdlConfig, JsonConfigStore};
pub use http::{HdlServer, PathResolver};
pub use ingest::Ingestor;
pub use pipeline::{HubConfig, MediaPipeline, Publisher, PublisherOrigin, StreamHub};
pub use pull::HttpFlvPuller;
pub use session::{FlvSession, SessionEnd, SessionState};
