// Session orchestrator: wires feed -> processor -> sink, with latency telemetry

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::clients::{OrderBookStreamClient, ReconnectPolicy};
use crate::config::Config;
use crate::core::tick_processor::TickProcessor;
use crate::core::types::{Session, Tick};
use crate::error::SimulatorResult;
use crate::sink::SinkHandle;
use crate::telemetry::{LatencyLogger, LatencyRecord};
use crate::validation::SessionParams;

struct ActiveProcessor {
    generation: u64,
    processor: TickProcessor,
}

/// State shared with the feed's dispatcher task
struct TickPipeline {
    active: Mutex<Option<ActiveProcessor>>,
    telemetry: Arc<LatencyLogger>,
    sink: SinkHandle,
    log_tick_latency: bool,
}

impl TickPipeline {
    fn on_tick(&self, generation: u64, tick: Tick) {
        let active = self.active.lock();
        let processor = match active.as_ref() {
            Some(active) if active.generation == generation => &active.processor,
            // Idle, or a late tick from a connection that has been replaced
            _ => return,
        };

        let t0 = Instant::now();
        let estimate = processor.process_tick(&tick);
        let t1 = Instant::now();

        self.sink.submit(estimate.display_fields());
        let t2 = Instant::now();

        let processing_ms = (t1 - t0).as_secs_f64() * 1000.0;
        let ui_ms = (t2 - t1).as_secs_f64() * 1000.0;
        let total_ms = (t2 - t0).as_secs_f64() * 1000.0;

        if self.log_tick_latency {
            info!(
                "[Latency] Processing: {:.2} ms | UI: {:.2} ms | Total: {:.2} ms",
                processing_ms, ui_ms, total_ms
            );
        } else {
            debug!(
                "[Latency] Processing: {:.2} ms | UI: {:.2} ms | Total: {:.2} ms",
                processing_ms, ui_ms, total_ms
            );
        }

        self.telemetry.log(LatencyRecord::now(processing_ms, ui_ms, total_ms));
    }
}

/// Owns the lifecycle of at most one simulation session.
///
/// Idle: no processor, no connection. Active: both live. Starting a new
/// session while active closes the old connection before the new one opens.
pub struct SessionOrchestrator {
    config: Arc<Config>,
    pipeline: Arc<TickPipeline>,
    client: Option<OrderBookStreamClient>,
    session: Option<Session>,
    next_generation: u64,
}

impl SessionOrchestrator {
    pub fn new(config: Arc<Config>, telemetry: Arc<LatencyLogger>, sink: SinkHandle) -> Self {
        let pipeline = Arc::new(TickPipeline {
            active: Mutex::new(None),
            telemetry,
            sink,
            log_tick_latency: config.logging.log_tick_latency,
        });

        Self {
            config,
            pipeline,
            client: None,
            session: None,
            next_generation: 0,
        }
    }

    /// Validate raw parameters and start (or replace) the session.
    ///
    /// Invalid parameters leave the current state untouched.
    pub fn start_simulation(&mut self, params: &SessionParams) -> SimulatorResult<()> {
        let session = params.validate(&self.config)?;
        self.start_session(session)
    }

    /// Start (or replace) a session from already-validated parameters
    pub fn start_session(&mut self, session: Session) -> SimulatorResult<()> {
        let processor = TickProcessor::with_config(session.clone(), &self.config);

        if let Some(mut previous) = self.client.take() {
            previous.close();
            info!("🔁 Replacing active session");
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        *self.pipeline.active.lock() = Some(ActiveProcessor { generation, processor });

        let url = self.config.feed.url_for(&session.instrument);
        let mut client = OrderBookStreamClient::new(
            url.clone(),
            ReconnectPolicy::from_config(&self.config.reconnect),
        );

        let pipeline = Arc::clone(&self.pipeline);
        if let Err(e) = client.connect(move |tick| pipeline.on_tick(generation, tick)) {
            *self.pipeline.active.lock() = None;
            self.session = None;
            return Err(e);
        }

        info!(
            "🚀 Session started: {} | quantity ${} | volatility {} | {}",
            session.instrument, session.quantity, session.volatility, session.fee_tier
        );
        info!("📡 Streaming {}", url);

        self.client = Some(client);
        self.session = Some(session);
        Ok(())
    }

    /// Active -> Idle. No-op when already idle.
    pub fn stop_simulation(&mut self) {
        if let Some(mut client) = self.client.take() {
            client.close();
        }
        *self.pipeline.active.lock() = None;
        if self.session.take().is_some() {
            info!("⏹️  Session stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn current_session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Whether the active session's feed connection is still running
    pub fn is_streaming(&self) -> bool {
        self.client.as_ref().map(|c| c.is_connected()).unwrap_or(false)
    }

    pub fn ticks_received(&self) -> u64 {
        self.client.as_ref().map(|c| c.ticks_received()).unwrap_or(0)
    }
}

impl Drop for SessionOrchestrator {
    fn drop(&mut self) {
        self.stop_simulation();
    }
}
