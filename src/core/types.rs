// Core data types shared by the processor, orchestrator and feed client

use serde::{Deserialize, Deserializer};
use std::fmt;

use crate::config::{FeeRates, FeeSchedule};

/// Marker shown for every field of an estimate computed from an invalid tick
pub const UNAVAILABLE: &str = "---";

pub const EXPECTED_SLIPPAGE: &str = "Expected Slippage (USD)";
pub const EXPECTED_FEES: &str = "Expected Fees (USD)";
pub const MARKET_IMPACT: &str = "Market Impact (USD)";
pub const NET_COST: &str = "Net Cost (USD)";
pub const MAKER_TAKER: &str = "Maker/Taker (%)";
pub const INTERNAL_LATENCY: &str = "Internal Latency (ms)";

/// Output field labels in display order
pub const FIELD_LABELS: [&str; 6] = [
    EXPECTED_SLIPPAGE,
    EXPECTED_FEES,
    MARKET_IMPACT,
    NET_COST,
    MAKER_TAKER,
    INTERNAL_LATENCY,
];

/// One (price, quantity) level of an order book side.
///
/// Decodes from a JSON array whose first two entries are numbers or numeric
/// strings; further entries (order counts etc.) are ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceLevel {
    pub price: f64,
    pub quantity: f64,
}

impl PriceLevel {
    pub fn new(price: f64, quantity: f64) -> Self {
        Self { price, quantity }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeedNumber {
    Number(f64),
    Text(String),
}

impl FeedNumber {
    fn to_f64(&self) -> Result<f64, String> {
        match self {
            FeedNumber::Number(n) => Ok(*n),
            FeedNumber::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid numeric value {:?}", s)),
        }
    }
}

impl<'de> Deserialize<'de> for PriceLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<FeedNumber>::deserialize(deserializer)?;
        if raw.len() < 2 {
            return Err(serde::de::Error::custom(format!(
                "price level needs [price, quantity], got {} entries",
                raw.len()
            )));
        }
        let price = raw[0].to_f64().map_err(serde::de::Error::custom)?;
        let quantity = raw[1].to_f64().map_err(serde::de::Error::custom)?;
        Ok(PriceLevel { price, quantity })
    }
}

/// An L2 order-book snapshot: bids descending, asks ascending
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Tick {
    #[serde(default)]
    pub bids: Vec<PriceLevel>,
    #[serde(default)]
    pub asks: Vec<PriceLevel>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

impl Tick {
    pub fn new(bids: Vec<PriceLevel>, asks: Vec<PriceLevel>) -> Self {
        Self {
            bids,
            asks,
            ..Self::default()
        }
    }

    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }

    /// Both sides present and non-empty
    pub fn is_valid(&self) -> bool {
        !self.bids.is_empty() && !self.asks.is_empty()
    }

    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.price + ask.price) / 2.0),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeTier {
    Tier1,
    Tier2,
}

impl FeeTier {
    pub const TIER_1_LABEL: &'static str = "Tier 1";
    pub const TIER_2_LABEL: &'static str = "Tier 2";

    /// Exact label match; `None` for anything unrecognized
    pub fn parse_strict(label: &str) -> Option<Self> {
        match label.trim() {
            Self::TIER_1_LABEL => Some(FeeTier::Tier1),
            Self::TIER_2_LABEL => Some(FeeTier::Tier2),
            _ => None,
        }
    }

    /// "Tier 1" selects Tier 1; every other label falls back to Tier 2
    pub fn from_label(label: &str) -> Self {
        match Self::parse_strict(label) {
            Some(tier) => tier,
            None => {
                tracing::warn!("Unrecognized fee tier {:?}, using {}", label, Self::TIER_2_LABEL);
                FeeTier::Tier2
            }
        }
    }

    pub fn rates(&self, schedule: &FeeSchedule) -> FeeRates {
        match self {
            FeeTier::Tier1 => schedule.tier1,
            FeeTier::Tier2 => schedule.tier2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FeeTier::Tier1 => Self::TIER_1_LABEL,
            FeeTier::Tier2 => Self::TIER_2_LABEL,
        }
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Immutable parameters of one simulation session
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Target order size, USD notional
    pub quantity: f64,
    pub volatility: f64,
    pub fee_tier: FeeTier,
    pub instrument: String,
}

/// Numeric result of processing one valid tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostBreakdown {
    pub mid_price: f64,
    pub slippage: f64,
    pub fees: f64,
    pub market_impact: f64,
    pub net_cost: f64,
    pub maker_probability: f64,
    pub taker_probability: f64,
    pub latency_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CostEstimate {
    Available(CostBreakdown),
    Unavailable,
}

impl CostEstimate {
    pub fn is_available(&self) -> bool {
        matches!(self, CostEstimate::Available(_))
    }

    pub fn breakdown(&self) -> Option<&CostBreakdown> {
        match self {
            CostEstimate::Available(breakdown) => Some(breakdown),
            CostEstimate::Unavailable => None,
        }
    }

    /// Render the six named output fields as display strings
    pub fn display_fields(&self) -> DisplayFields {
        let values = match self {
            CostEstimate::Available(b) => [
                format!("{:.4}", b.slippage),
                format!("{:.4}", b.fees),
                format!("{:.4}", b.market_impact),
                format!("{:.4}", b.net_cost),
                format!("{:.1}/{:.1}", b.maker_probability * 100.0, b.taker_probability * 100.0),
                format!("{:.2}", b.latency_ms),
            ],
            CostEstimate::Unavailable => std::array::from_fn(|_| UNAVAILABLE.to_string()),
        };

        DisplayFields(FIELD_LABELS.into_iter().zip(values).collect())
    }
}

/// Ordered label -> display string map handed to the output sink
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFields(Vec<(&'static str, String)>);

impl DisplayFields {
    pub fn get(&self, label: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| *key == label)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(key, value)| (*key, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_feed_payload_with_string_levels() {
        let json = r#"{
            "timestamp": "2025-05-04T10:39:13Z",
            "exchange": "OKX",
            "symbol": "BTC-USDT-SWAP",
            "asks": [["95445.5", "9.06"], ["95448", "2.05"]],
            "bids": [["95445.4", "1104.23"], ["95445.3", "0.02"]]
        }"#;

        let tick: Tick = serde_json::from_str(json).unwrap();
        assert_eq!(tick.best_ask(), Some(&PriceLevel::new(95445.5, 9.06)));
        assert_eq!(tick.best_bid(), Some(&PriceLevel::new(95445.4, 1104.23)));
        assert_eq!(tick.symbol.as_deref(), Some("BTC-USDT-SWAP"));
        assert_eq!(tick.bids.len(), 2);
    }

    #[test]
    fn decodes_numeric_levels_and_ignores_extra_entries() {
        let tick: Tick = serde_json::from_str(r#"{"bids": [[100.0, 1, 4]], "asks": [[100.2, 1, 2]]}"#).unwrap();
        assert_eq!(tick.mid_price(), Some(100.1));
    }

    #[test]
    fn rejects_non_numeric_level() {
        let result = serde_json::from_str::<Tick>(r#"{"bids": [["abc", "1"]], "asks": [["1", "1"]]}"#);
        assert!(result.is_err());

        let result = serde_json::from_str::<Tick>(r#"{"bids": [["100"]], "asks": [["1", "1"]]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn missing_side_decodes_as_invalid_tick() {
        let tick: Tick = serde_json::from_str(r#"{"bids": [["100", "1"]]}"#).unwrap();
        assert!(!tick.is_valid());
        assert_eq!(tick.mid_price(), None);
    }

    #[test]
    fn fee_tier_fallback_is_tier_2() {
        assert_eq!(FeeTier::from_label("Tier 1"), FeeTier::Tier1);
        assert_eq!(FeeTier::from_label("Tier 2"), FeeTier::Tier2);
        assert_eq!(FeeTier::from_label("VIP 9"), FeeTier::Tier2);
        assert_eq!(FeeTier::parse_strict("VIP 9"), None);

        let schedule = FeeSchedule::default();
        assert_eq!(FeeTier::Tier1.rates(&schedule), FeeRates { maker: 0.0010, taker: 0.0015 });
        assert_eq!(FeeTier::Tier2.rates(&schedule), FeeRates { maker: 0.0008, taker: 0.0012 });
    }

    #[test]
    fn unavailable_estimate_renders_marker_everywhere() {
        let fields = CostEstimate::Unavailable.display_fields();
        assert_eq!(fields.len(), 6);
        assert!(fields.iter().all(|(_, value)| value == UNAVAILABLE));
        let labels: Vec<_> = fields.iter().map(|(label, _)| label).collect();
        assert_eq!(labels, FIELD_LABELS.to_vec());
    }

    #[test]
    fn available_estimate_formats_fields() {
        let estimate = CostEstimate::Available(CostBreakdown {
            mid_price: 100.1,
            slippage: 0.04902,
            fees: 10.247237,
            market_impact: 0.00026,
            net_cost: 10.296517,
            maker_probability: 0.9526,
            taker_probability: 0.0474,
            latency_ms: 0.0123,
        });

        let fields = estimate.display_fields();
        assert_eq!(fields.get(EXPECTED_SLIPPAGE), Some("0.0490"));
        assert_eq!(fields.get(EXPECTED_FEES), Some("10.2472"));
        assert_eq!(fields.get(MARKET_IMPACT), Some("0.0003"));
        assert_eq!(fields.get(NET_COST), Some("10.2965"));
        assert_eq!(fields.get(MAKER_TAKER), Some("95.3/4.7"));
        assert_eq!(fields.get(INTERNAL_LATENCY), Some("0.01"));
    }
}
