// Latency telemetry: off-hot-path CSV persistence

pub mod latency_logger;

pub use latency_logger::{LatencyLogger, LatencyRecord, TelemetryStats, CSV_HEADER};
