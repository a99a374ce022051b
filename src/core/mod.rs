// Core simulation logic: data types, per-tick processing, session lifecycle

pub mod session;
pub mod tick_processor;
pub mod types;

// Re-export commonly used types
pub use session::SessionOrchestrator;
pub use tick_processor::TickProcessor;
pub use types::{CostBreakdown, CostEstimate, DisplayFields, FeeTier, PriceLevel, Session, Tick};
