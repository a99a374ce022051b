// Common test utilities and helpers

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::{accept_async, tungstenite::protocol::Message};
use tx_cost_simulator::core::types::EXPECTED_FEES;
use tx_cost_simulator::{Config, DisplayFields, OutputSink};

/// Create a test configuration pointed at a local feed
pub fn create_test_config(feed_addr: SocketAddr, log_file: &Path) -> Config {
    let mut config = Config::default();
    config.feed.base_url = format!("ws://{}", feed_addr);
    config.telemetry.log_file = log_file.to_string_lossy().into_owned();
    config.telemetry.flush_interval_ms = 50;
    config
}

/// Order-book frame in the feed's wire format (prices as strings)
pub fn book_frame(bid: f64, ask: f64) -> String {
    format!(
        r#"{{"timestamp":"2025-05-04T10:39:13Z","exchange":"OKX","symbol":"BTC-USDT-SWAP","asks":[["{}","1.5"],["{}","3.0"]],"bids":[["{}","2.0"],["{}","1.0"]]}}"#,
        ask,
        ask + 0.1,
        bid,
        bid - 0.1
    )
}

pub type Rendered = Arc<Mutex<Vec<DisplayFields>>>;

/// Sink that keeps every render for later inspection
pub struct RecordingSink(pub Rendered);

impl RecordingSink {
    pub fn new() -> (Self, Rendered) {
        let rendered = Arc::new(Mutex::new(Vec::new()));
        (Self(Arc::clone(&rendered)), rendered)
    }
}

impl OutputSink for RecordingSink {
    fn render(&mut self, fields: &DisplayFields) {
        self.0.lock().unwrap().push(fields.clone());
    }
}

pub fn rendered_fees(rendered: &Rendered) -> Vec<String> {
    rendered
        .lock()
        .unwrap()
        .iter()
        .filter_map(|fields| fields.get(EXPECTED_FEES).map(str::to_string))
        .collect()
}

/// Local order-book feed. Every accepted connection gets the same frames,
/// either cycled until the client leaves or sent once followed by a close.
pub struct FeedServer {
    pub addr: SocketAddr,
    pub connections: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl FeedServer {
    pub async fn start(frames: Vec<String>, repeat: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind feed server");
        let addr = listener.local_addr().expect("Feed server has no address");
        let connections = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));

        let accepted = Arc::clone(&connections);
        let finished = Arc::clone(&closed);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                accepted.fetch_add(1, Ordering::SeqCst);
                let frames = frames.clone();
                let finished = Arc::clone(&finished);
                tokio::spawn(async move {
                    serve_connection(stream, frames, repeat).await;
                    finished.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        Self {
            addr,
            connections,
            closed,
            task,
        }
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Drop for FeedServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_connection(stream: tokio::net::TcpStream, frames: Vec<String>, repeat: bool) {
    let Ok(ws) = accept_async(stream).await else {
        return;
    };
    let (mut tx, mut rx) = ws.split();
    let mut ticker = tokio::time::interval(Duration::from_millis(10));
    let mut sent = 0usize;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !repeat && sent == frames.len() {
                    let _ = tx.send(Message::Close(None)).await;
                    return;
                }
                let frame = frames[sent % frames.len()].clone();
                sent += 1;
                if tx.send(Message::Text(frame)).await.is_err() {
                    return;
                }
            }
            message = rx.next() => match message {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                Some(Ok(_)) => {}
            }
        }
    }
}

/// Poll `condition` until it holds or `timeout` passes
pub async fn wait_until<F: FnMut() -> bool>(timeout: Duration, mut condition: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
