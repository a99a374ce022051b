// Almgren-Chriss style market impact

use serde::{Deserialize, Serialize};

use super::round_to;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactParams {
    /// Average daily traded volume; must be positive
    pub daily_volume: f64,
    /// Temporary impact coefficient
    pub eta: f64,
    /// Permanent impact coefficient
    pub gamma: f64,
    /// Trading horizon in days
    pub time_horizon: f64,
}

impl Default for ImpactParams {
    fn default() -> Self {
        Self {
            daily_volume: 1_000_000.0,
            eta: 0.142,
            gamma: 2.5e-6,
            time_horizon: 1.0,
        }
    }
}

impl ImpactParams {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.daily_volume.is_finite() && self.daily_volume > 0.0) {
            return Err("models.impact.daily_volume must be a positive number".to_string());
        }
        if !(self.time_horizon.is_finite() && self.time_horizon >= 0.0) {
            return Err("models.impact.time_horizon must be non-negative".to_string());
        }
        Ok(())
    }
}

/// Temporary plus permanent impact for executing `quantity`, rounded to 5 decimals.
///
/// Temporary impact is `eta * (quantity / daily_volume) * sqrt(time_horizon)`,
/// permanent impact is `gamma * quantity`. `volatility` is accepted for
/// signature parity with the other models; the linear form ignores it.
pub fn market_impact(quantity: f64, _volatility: f64, params: &ImpactParams) -> f64 {
    debug_assert!(params.daily_volume > 0.0, "daily_volume must be positive");

    let temporary = params.eta * (quantity / params.daily_volume) * params.time_horizon.sqrt();
    let permanent = params.gamma * quantity;

    round_to(temporary + permanent, 5)
}
