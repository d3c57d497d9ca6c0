use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use axum::{
    body::Body,
    extract::{ConnectInfo, Query, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{debug, info, warn};
use serde::Deserialize;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use crate::config::HdlConfig;
use crate::http::PathResolver;
use crate::ingest::Ingestor;
use crate::pipeline::{MediaPipeline, StreamDescriptor};
use crate::session::FlvSession;
use crate::Error;

/// Shared state of every handler
#[derive(Clone)]
pub struct HdlState {
    pub pipeline: Arc<dyn MediaPipeline>,
    pub ingestor: Arc<Ingestor>,
    pub config: Arc<RwLock<HdlConfig>>,
    pub resolver: Arc<PathResolver>,
    pub list_cache: Arc<ListCache>,
    /// Cancelled on server shutdown; every session holds a child token
    pub shutdown: CancellationToken,
}

/// Routes:
/// - GET /pull?target=<url>&streamPath=<path>&save=<0|1>
/// - GET /list
/// - GET /[<prefix>/]<path>[.flv] - FLV stream
pub fn create_router(state: HdlState) -> Router {
    Router::new()
        .route("/pull", get(handle_pull))
        .route("/list", get(handle_list))
        .fallback(handle_stream)
        .with_state(state)
}

fn error_response(e: &Error) -> Response {
    let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, e.to_string()).into_response()
}

async fn handle_stream(
    State(state): State<HdlState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    uri: Uri,
) -> Response {
    let mut session = match FlvSession::resolve(&state.resolver, uri.path(), peer.to_string()) {
        Ok(session) => session,
        Err(e) => {
            debug!("{} from {}: {}", uri.path(), peer, e);
            return error_response(&e);
        }
    };

    let (wait_timeout, buffer) = {
        let config = state.config.read().await;
        (config.wait_timeout(), config.response_buffer)
    };

    if let Err(e) = session.negotiate(state.pipeline.as_ref(), wait_timeout).await {
        warn!("{}: subscribe from {} refused: {}", session.path(), peer, e);
        return error_response(&e);
    }

    // Bounded so a slow client only stalls its own session
    let (tx, rx) = mpsc::channel(buffer);
    let cancel = state.shutdown.child_token();
    tokio::spawn(async move {
        // Errors are logged by the session itself
        let _ = session.run(tx, cancel).await;
    });

    let body = Body::from_stream(ReceiverStream::new(rx));
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/x-flv")
        .header(header::CACHE_CONTROL, "no-cache, no-store")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(body)
        .unwrap_or_else(|e| error_response(&Error::stream(e.to_string())))
}

#[derive(Debug, Deserialize)]
struct PullParams {
    target: Option<String>,
    #[serde(rename = "streamPath")]
    stream_path: Option<String>,
    save: Option<String>,
}

async fn handle_pull(State(state): State<HdlState>, Query(params): Query<PullParams>) -> Response {
    let target = params.target.unwrap_or_default();
    let stream_path = params.stream_path.unwrap_or_default();
    let save = params.save.as_deref() == Some("1");

    match state.ingestor.pull(&stream_path, &target, save).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            warn!("Pull {} -> '{}' failed: {}", target, stream_path, e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn handle_list(State(state): State<HdlState>) -> Json<Vec<StreamDescriptor>> {
    Json(state.list_cache.get(state.pipeline.as_ref()).await)
}

/// Pulled-stream listing, recomputed at most once per `ttl`
pub struct ListCache {
    ttl: Duration,
    cached: Mutex<Option<(Instant, Vec<StreamDescriptor>)>>,
}

impl ListCache {
    pub fn new(ttl: Duration) -> Self {
        ListCache {
            ttl,
            cached: Mutex::new(None),
        }
    }

    pub async fn get(&self, pipeline: &dyn MediaPipeline) -> Vec<StreamDescriptor> {
        let mut cached = self.cached.lock().await;
        if let Some((at, list)) = cached.as_ref() {
            if at.elapsed() < self.ttl {
                return list.clone();
            }
        }

        let list: Vec<StreamDescriptor> = pipeline
            .list_streams()
            .await
            .into_iter()
            .filter(|s| s.origin.is_pull())
            .collect();
        info!("Listing {} pulled stream(s)", list.len());
        *cached = Some((Instant::now(), list.clone()));
        list
    }
}
