// Real-time Transaction Cost Simulator
//
// Streams L2 order-book snapshots, turns each into a transaction cost estimate
// and records per-tick latency for offline analysis.

pub mod clients;
pub mod config;
pub mod core;
pub mod error;       // Unified error handling
pub mod models;
pub mod sink;
pub mod telemetry;
pub mod validation;  // Session parameter checks

// Re-export core types
pub use crate::core::{
    CostBreakdown, CostEstimate, DisplayFields, FeeTier, PriceLevel, Session, SessionOrchestrator,
    Tick, TickProcessor,
};

// Re-export error types
pub use error::{SimulatorError, SimulatorResult};

// Re-export client types
pub use clients::{OrderBookStreamClient, ReconnectPolicy};

// Re-export configuration
pub use config::{Config, ConfigError, FeeRates, FeeSchedule, FeedConfig, ModelConfig};

// Re-export models
pub use models::{CostModel, MarketCostModel};

// Re-export sink and telemetry
pub use sink::{ConsoleSink, OutputSink, SinkExecutor, SinkHandle};
pub use telemetry::{LatencyLogger, LatencyRecord};

pub use validation::SessionParams;
