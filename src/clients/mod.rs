// Market data feed clients

pub mod orderbook_ws;
pub mod reconnect;

// Re-export client types
pub use orderbook_ws::{decode_frame, OrderBookStreamClient};
pub use reconnect::ReconnectPolicy;
