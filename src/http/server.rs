use std::net::SocketAddr;
use std::sync::Arc;
use log::{error, info};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use crate::config::{ConfigStore, HdlConfig};
use crate::http::router::{create_router, HdlState, ListCache};
use crate::http::PathResolver;
use crate::ingest::Ingestor;
use crate::pipeline::MediaPipeline;
use crate::{Error, Result};

pub struct HdlServer {
    /// Server configuration
    config: Arc<RwLock<HdlConfig>>,

    /// Handler state
    state: HdlState,

    /// Cancels the accept loop and every session
    shutdown: CancellationToken,
}

impl HdlServer {
    pub fn new(config: HdlConfig, pipeline: Arc<dyn MediaPipeline>, store: Arc<dyn ConfigStore>) -> Result<Self> {
        config.validate()?;
        let resolver = Arc::new(PathResolver::new(&config.path_prefix)?);
        let list_cache = Arc::new(ListCache::new(config.list_cache_ttl()));
        let config = Arc::new(RwLock::new(config));
        let ingestor = Arc::new(Ingestor::new(pipeline.clone(), config.clone(), store));
        let shutdown = CancellationToken::new();

        let state = HdlState {
            pipeline,
            ingestor,
            config: config.clone(),
            resolver,
            list_cache,
            shutdown: shutdown.clone(),
        };

        Ok(HdlServer { config, state, shutdown })
    }

    /// Shared configuration, updated by saved pulls
    pub fn config(&self) -> Arc<RwLock<HdlConfig>> {
        self.config.clone()
    }

    pub fn ingestor(&self) -> Arc<Ingestor> {
        self.state.ingestor.clone()
    }

    /// Token that stops the server when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Replay saved pulls if enabled
    pub async fn pull_on_start(&self) {
        if !self.config.read().await.pull.pull_on_start {
            return;
        }
        let reports = self.state.ingestor.pull_on_start().await;
        let failed = reports.iter().filter(|r| r.result.is_err()).count();
        info!("Replayed {} saved pull(s), {} failed", reports.len(), failed);
    }

    /// Bind the configured address and serve until shutdown
    pub async fn listen(&self) -> Result<()> {
        let addr = self.config.read().await.listen_addr.clone();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::config(format!("Failed to bind {}: {}", addr, e)))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        info!("HDL listening on {}", addr);

        let app = create_router(self.state.clone());
        let shutdown = self.shutdown.clone();
        let result = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await;

        if let Err(e) = &result {
            error!("HDL server on {} failed: {}", addr, e);
        }
        info!("HDL server on {} stopped", addr);
        result.map_err(Error::from)
    }

    /// Stop accepting and end every session
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
