// Common test utilities and helper functions
//
// Servers are started on fixed local ports; each test uses its own port.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use bytes::Bytes;
use hdl::{
    AudioCodec, AudioTrackInfo, FlvHeader, FlvTag, FlvTagReader, HdlConfig, HdlServer,
    HttpFlvPuller, HubConfig, JsonConfigStore, Publisher, PublisherOrigin, StreamHub, VideoCodec,
    VideoTrackInfo,
};

pub const AVC_SEQUENCE_HEADER: [u8; 5] = [0x17, 0x00, 0x00, 0x00, 0x00];
pub const AAC_SEQUENCE_HEADER: [u8; 4] = [0xAF, 0x00, 0x12, 0x10];

pub struct TestServer {
    pub server: Arc<HdlServer>,
    pub hub: Arc<StreamHub>,
    pub port: u16,
    // Holds the config directory alive for the test
    pub dir: tempfile::TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    pub fn config_path(&self) -> std::path::PathBuf {
        self.dir.path().join("hdl.json")
    }
}

/// Start a server with an in-memory hub that can pull over HTTP-FLV
pub async fn start_server(port: u16) -> TestServer {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = Arc::new(JsonConfigStore::new(dir.path().join("hdl.json")));

    let config = HdlConfig::builder()
        .listen_addr(format!("127.0.0.1:{}", port))
        .wait_timeout(Duration::from_secs(2))
        .build()
        .expect("Failed to build config");

    let puller = Arc::new(HttpFlvPuller::new(Duration::from_secs(2)).expect("Failed to build puller"));
    let hub = Arc::new(StreamHub::new(HubConfig::default()).with_puller(puller));
    let server = Arc::new(HdlServer::new(config, hub.clone(), store).expect("Failed to build server"));

    let listener = server.clone();
    tokio::spawn(async move { listener.listen().await });
    assert!(wait_for_server(port, 20).await, "Server did not start on {}", port);

    TestServer { server, hub, port, dir }
}

/// Helper function to wait for server to start
pub async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    for _ in 0..max_attempts {
        if tokio::net::TcpStream::connect(format!("127.0.0.1:{}", port))
            .await
            .is_ok()
        {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}

/// Publish a pushed stream with an AVC and an AAC track
pub async fn publish_av(hub: &StreamHub, path: &str) -> Arc<Publisher> {
    let publisher = hub
        .publish(path, PublisherOrigin::Push)
        .await
        .expect("Failed to publish");
    publisher.set_video_track(
        VideoTrackInfo::new(VideoCodec::H264, 640, 360).with_decoder_config(AVC_SEQUENCE_HEADER.to_vec()),
    );
    publisher.set_audio_track(
        AudioTrackInfo::new(AudioCodec::AAC, 44100, 16, 2).with_decoder_config(AAC_SEQUENCE_HEADER.to_vec()),
    );
    publisher.mark_tracks_complete();
    publisher
}

/// Incrementally parsed FLV response body
pub struct FlvBody {
    response: reqwest::Response,
    reader: FlvTagReader,
}

impl FlvBody {
    pub fn new(response: reqwest::Response) -> Self {
        FlvBody {
            response,
            reader: FlvTagReader::new(),
        }
    }

    pub fn header(&self) -> Option<FlvHeader> {
        self.reader.header()
    }

    /// Next tag, or `None` when the body ends
    pub async fn next_tag(&mut self) -> Option<FlvTag> {
        loop {
            if let Some(tag) = self.reader.next_tag().expect("Malformed FLV body") {
                return Some(tag);
            }
            let chunk: Bytes = tokio::time::timeout(Duration::from_secs(5), self.response.chunk())
                .await
                .expect("Timed out reading body")
                .expect("Body read failed")?;
            self.reader.push(&chunk);
        }
    }
}
