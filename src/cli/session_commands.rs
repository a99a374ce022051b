// Session command handlers for the cost-sim CLI

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use tx_cost_simulator::core::types::{PriceLevel, Tick};
use tx_cost_simulator::{
    Config, ConsoleSink, LatencyLogger, SessionOrchestrator, SessionParams, SinkExecutor,
    TickProcessor,
};

/// Stream the feed for one session until Ctrl-C or the optional time limit
pub async fn run_session(
    params: SessionParams,
    minutes: Option<f64>,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(config);

    let telemetry = Arc::new(LatencyLogger::start(
        &config.telemetry.log_file,
        config.telemetry.flush_interval(),
    )?);
    let mut sink = SinkExecutor::spawn(ConsoleSink::default())?;
    let mut orchestrator =
        SessionOrchestrator::new(Arc::clone(&config), Arc::clone(&telemetry), sink.handle());

    if let Err(e) = orchestrator.start_simulation(&params) {
        error!("❌ {}", e.user_message());
        telemetry.stop();
        return Err(e.into());
    }

    if config.reconnect.max_retries == 0 {
        info!("ℹ️  Reconnection disabled: a dropped feed ends the stream");
    }

    match minutes {
        Some(minutes) if minutes > 0.0 => {
            let limit = Duration::from_secs_f64(minutes * 60.0);
            info!("⏰ Running for {:.1} minutes (Ctrl-C to stop early)", minutes);
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("🛑 Interrupted"),
                _ = tokio::time::sleep(limit) => info!("⏰ Time limit reached"),
            }
        }
        _ => {
            info!("Press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
            info!("🛑 Interrupted");
        }
    }

    let ticks = orchestrator.ticks_received();
    orchestrator.stop_simulation();
    sink.shutdown();
    telemetry.stop();

    let stats = telemetry.stats();
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("📊 Ticks received: {}", ticks);
    info!("📝 Latency rows written: {} -> {}", stats.rows_written, config.telemetry.log_file);
    if stats.dropped_records > 0 {
        warn!("⚠️  Latency rows dropped: {}", stats.dropped_records);
    }
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    Ok(())
}

/// Price a single hypothetical top of book without touching the network
pub fn estimate_once(
    params: SessionParams,
    bid: f64,
    ask: f64,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = params.validate(config).map_err(|e| {
        error!("❌ {}", e.user_message());
        e
    })?;

    if bid > ask {
        warn!("⚠️  Crossed book: bid {} > ask {}", bid, ask);
    }

    let processor = TickProcessor::with_config(session, config);
    let tick = Tick::new(vec![PriceLevel::new(bid, 0.0)], vec![PriceLevel::new(ask, 0.0)]);
    let estimate = processor.process_tick(&tick);

    info!("🧮 Cost estimate (bid {} / ask {})", bid, ask);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (label, value) in estimate.display_fields().iter() {
        info!("  {:<24} {}", label, value);
    }
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    Ok(())
}
