// Regression-based slippage estimate (linear, with a quantity x volatility term)

use serde::{Deserialize, Serialize};

use super::round_to;

/// Coefficients for `b0 + b1*q + b2*sigma + b3*q*sigma`.
///
/// The defaults are placeholders, not a fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlippageCoefficients {
    pub beta_0: f64,
    pub beta_1: f64,
    pub beta_2: f64,
    pub beta_3: f64,
}

impl Default for SlippageCoefficients {
    fn default() -> Self {
        Self {
            beta_0: 0.005,
            beta_1: 0.0003,
            beta_2: 0.7,
            beta_3: 0.00001,
        }
    }
}

pub fn predicted_slippage(quantity: f64, volatility: f64, coefficients: &SlippageCoefficients) -> f64 {
    let slippage = coefficients.beta_0
        + coefficients.beta_1 * quantity
        + coefficients.beta_2 * volatility
        + coefficients.beta_3 * quantity * volatility;

    round_to(slippage, 5)
}
