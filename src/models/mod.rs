// Market-microstructure cost models
//
// Every function here is pure: the same inputs always produce the same rounded
// output. Coefficients arrive as plain parameter structs so they can be
// recalibrated from config without touching call sites.

pub mod maker_taker;
pub mod market_impact;
pub mod slippage;

pub use maker_taker::{logistic, maker_taker_probability, MakerTakerParams, MakerTakerSplit};
pub use market_impact::{market_impact, ImpactParams};
pub use slippage::{predicted_slippage, SlippageCoefficients};

use crate::config::ModelConfig;

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// The three models a tick processor needs for one session
pub trait CostModel {
    fn market_impact(&self, quantity: f64, volatility: f64) -> f64;
    fn slippage(&self, quantity: f64, volatility: f64) -> f64;
    fn maker_taker(&self, volatility: f64) -> MakerTakerSplit;
}

/// Production model set backed by configured coefficients
#[derive(Debug, Clone, Default)]
pub struct MarketCostModel {
    impact: ImpactParams,
    slippage: SlippageCoefficients,
    maker_taker: MakerTakerParams,
}

impl MarketCostModel {
    pub fn new(impact: ImpactParams, slippage: SlippageCoefficients, maker_taker: MakerTakerParams) -> Self {
        Self { impact, slippage, maker_taker }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(config.impact.clone(), config.slippage.clone(), config.maker_taker.clone())
    }
}

impl CostModel for MarketCostModel {
    fn market_impact(&self, quantity: f64, volatility: f64) -> f64 {
        market_impact(quantity, volatility, &self.impact)
    }

    fn slippage(&self, quantity: f64, volatility: f64) -> f64 {
        predicted_slippage(quantity, volatility, &self.slippage)
    }

    fn maker_taker(&self, volatility: f64) -> MakerTakerSplit {
        maker_taker_probability(volatility, &self.maker_taker)
    }
}
