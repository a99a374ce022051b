// Logistic maker/taker split

use serde::{Deserialize, Serialize};

use super::round_to;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MakerTakerParams {
    /// Steepness of the logistic transition
    pub sensitivity: f64,
    /// Volatility at which maker and taker are equally likely
    pub threshold: f64,
}

impl Default for MakerTakerParams {
    fn default() -> Self {
        Self {
            sensitivity: 50.0,
            threshold: 0.08,
        }
    }
}

impl MakerTakerParams {
    pub fn validate(&self) -> Result<(), String> {
        if !self.sensitivity.is_finite() || !self.threshold.is_finite() {
            return Err("models.maker_taker parameters must be finite".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MakerTakerSplit {
    pub maker: f64,
    pub taker: f64,
}

/// Standard logistic `1 / (1 + e^-z)` without overflow for large |z|
pub fn logistic(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Maker probability is `logistic(-sensitivity * (volatility - threshold))`.
///
/// Both sides are rounded to 4 decimals; taker is derived from the rounded
/// maker value so the pair always sums to exactly one.
pub fn maker_taker_probability(volatility: f64, params: &MakerTakerParams) -> MakerTakerSplit {
    let z = -params.sensitivity * (volatility - params.threshold);
    let maker = round_to(logistic(z), 4);
    let taker = round_to(1.0 - maker, 4);

    MakerTakerSplit { maker, taker }
}
