// WebSocket client for the L2 order-book stream

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, info, trace, warn};

use crate::clients::reconnect::ReconnectPolicy;
use crate::core::types::Tick;
use crate::error::{SimulatorError, SimulatorResult};

/// Time a closing connection gets to send its close frame before it is aborted
const CLOSE_GRACE: Duration = Duration::from_millis(500);

/// Decode one text frame.
///
/// `Ok(None)` for frames that are not order-book snapshots (no `bids` or no
/// `asks` key); those are dropped quietly. Anything else that fails to decode
/// is an error.
pub fn decode_frame(text: &str) -> Result<Option<Tick>, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;
    if value.get("bids").is_none() || value.get("asks").is_none() {
        return Ok(None);
    }
    serde_json::from_value(value).map(Some)
}

enum StreamEnd {
    Shutdown,
    ConsumerGone,
    Closed,
}

struct Connection {
    live: Arc<AtomicBool>,
    shutdown_tx: watch::Sender<bool>,
    reader: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

impl Connection {
    fn shutdown(self) {
        self.live.store(false, Ordering::Release);
        let _ = self.shutdown_tx.send(true);
        self.dispatcher.abort();

        let reader = self.reader;
        let abort = reader.abort_handle();
        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if tokio::time::timeout(CLOSE_GRACE, reader).await.is_err() {
                        abort.abort();
                    }
                });
            }
            Err(_) => abort.abort(),
        }
    }
}

/// One long-lived order-book stream.
///
/// The reader task decodes frames and hands ticks to a dispatcher task over
/// an unbounded channel, so the socket is never stalled by consumer work.
/// The dispatcher calls the registered handler in arrival order.
pub struct OrderBookStreamClient {
    url: String,
    policy: ReconnectPolicy,
    ticks_received: Arc<AtomicU64>,
    connection: Option<Connection>,
}

impl OrderBookStreamClient {
    pub fn new(url: impl Into<String>, policy: ReconnectPolicy) -> Self {
        Self {
            url: url.into(),
            policy,
            ticks_received: Arc::new(AtomicU64::new(0)),
            connection: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Start streaming in the background and return immediately.
    ///
    /// Must be called from within a Tokio runtime. The handler runs on a
    /// runtime worker, concurrently with the caller, and must not block.
    pub fn connect<F>(&mut self, on_tick: F) -> SimulatorResult<()>
    where
        F: FnMut(Tick) + Send + 'static,
    {
        let runtime = Handle::try_current()
            .map_err(|e| SimulatorError::RuntimeUnavailable(e.to_string()))?;

        self.close();

        let live = Arc::new(AtomicBool::new(true));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();

        let reader = runtime.spawn(read_loop(
            self.url.clone(),
            self.policy.clone(),
            tick_tx,
            shutdown_rx,
            Arc::clone(&self.ticks_received),
        ));
        let dispatcher = runtime.spawn(dispatch_loop(tick_rx, Arc::clone(&live), on_tick));

        self.connection = Some(Connection {
            live,
            shutdown_tx,
            reader,
            dispatcher,
        });
        Ok(())
    }

    /// Stop the stream. Idempotent; fine to call before `connect` or after
    /// the connection already died.
    pub fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.shutdown();
            debug!("Closed order book stream {}", self.url);
        }
    }

    /// A connection was started and its reader is still running
    pub fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .map(|connection| !connection.reader.is_finished())
            .unwrap_or(false)
    }

    /// Valid order-book frames decoded so far, across reconnects
    pub fn ticks_received(&self) -> u64 {
        self.ticks_received.load(Ordering::Relaxed)
    }
}

impl Drop for OrderBookStreamClient {
    fn drop(&mut self) {
        self.close();
    }
}

async fn dispatch_loop<F>(mut rx: mpsc::UnboundedReceiver<Tick>, live: Arc<AtomicBool>, mut on_tick: F)
where
    F: FnMut(Tick),
{
    while let Some(tick) = rx.recv().await {
        if !live.load(Ordering::Acquire) {
            break;
        }
        on_tick(tick);
    }
}

async fn read_loop(
    url: String,
    policy: ReconnectPolicy,
    tx: mpsc::UnboundedSender<Tick>,
    mut shutdown: watch::Receiver<bool>,
    ticks_received: Arc<AtomicU64>,
) {
    let mut attempt = 0u32;

    loop {
        if *shutdown.borrow() {
            return;
        }

        let before = ticks_received.load(Ordering::Relaxed);
        match stream_session(&url, &tx, shutdown.clone(), &ticks_received).await {
            Ok(StreamEnd::Shutdown) | Ok(StreamEnd::ConsumerGone) => return,
            Ok(StreamEnd::Closed) => warn!("⚠️ Order book stream closed by server: {}", url),
            Err(e) => warn!("⚠️ Order book stream failed ({}): {}", url, e),
        }

        // A session that delivered data resets the backoff
        if ticks_received.load(Ordering::Relaxed) > before {
            attempt = 0;
        }

        let Some(delay) = policy.delay_for(attempt) else {
            if policy.is_enabled() {
                warn!("Giving up on {} after {} reconnect attempts", url, attempt);
            }
            return;
        };
        attempt += 1;
        info!("🔄 Reconnecting to {} in {:?} (attempt {}/{})", url, delay, attempt, policy.max_retries());

        tokio::select! {
            _ = shutdown.changed() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

async fn stream_session(
    url: &str,
    tx: &mpsc::UnboundedSender<Tick>,
    mut shutdown: watch::Receiver<bool>,
    ticks_received: &AtomicU64,
) -> SimulatorResult<StreamEnd> {
    let (ws_stream, _) = tokio::select! {
        _ = shutdown.changed() => return Ok(StreamEnd::Shutdown),
        connected = connect_async(url) => connected?,
    };
    info!("✅ Connected to order book feed {}", url);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                let _ = ws_sender.send(Message::Close(None)).await;
                return Ok(StreamEnd::Shutdown);
            }
            message = ws_receiver.next() => match message {
                Some(Ok(Message::Text(text))) => match decode_frame(&text) {
                    Ok(Some(tick)) => {
                        ticks_received.fetch_add(1, Ordering::Relaxed);
                        if tx.send(tick).is_err() {
                            return Ok(StreamEnd::ConsumerGone);
                        }
                    }
                    Ok(None) => trace!("Skipping non order-book frame"),
                    Err(e) => warn!("⚠️ Dropping undecodable frame: {}", e),
                },
                Some(Ok(Message::Close(_))) | None => return Ok(StreamEnd::Closed),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }
}
