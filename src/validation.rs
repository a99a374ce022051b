//! Session parameter validation
//!
//! Raw parameters arrive as text from the parameter source (CLI today, a
//! form originally). Nothing about a running session changes unless every
//! check passes.

use tracing::warn;

use crate::config::Config;
use crate::core::types::{FeeTier, Session};
use crate::error::SimulatorResult;

/// Unvalidated session parameters as entered by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParams {
    pub quantity: String,
    pub volatility: String,
    pub fee_tier: String,
    pub instrument: String,
}

impl SessionParams {
    pub fn new(
        quantity: impl Into<String>,
        volatility: impl Into<String>,
        fee_tier: impl Into<String>,
        instrument: impl Into<String>,
    ) -> Self {
        Self {
            quantity: quantity.into(),
            volatility: volatility.into(),
            fee_tier: fee_tier.into(),
            instrument: instrument.into(),
        }
    }

    /// Turn raw input into a `Session`, or explain which field is wrong
    pub fn validate(&self, config: &Config) -> SimulatorResult<Session> {
        let quantity = parse_number("quantity", &self.quantity)?;
        if quantity <= 0.0 {
            return Err(crate::invalid_param!("quantity", "must be greater than 0"));
        }

        let volatility = parse_number("volatility", &self.volatility)?;
        if volatility < 0.0 {
            return Err(crate::invalid_param!("volatility", "must not be negative"));
        }

        let fee_tier = if config.session.strict_fee_tier {
            FeeTier::parse_strict(&self.fee_tier).ok_or_else(|| {
                crate::invalid_param!(
                    "fee_tier",
                    format!("{:?} is not one of \"Tier 1\", \"Tier 2\"", self.fee_tier)
                )
            })?
        } else {
            FeeTier::from_label(&self.fee_tier)
        };

        let instrument = self.instrument.trim();
        if !config.feed.instruments.iter().any(|known| known == instrument) {
            warn!("Rejected unknown instrument {:?}", instrument);
            return Err(crate::invalid_param!(
                "instrument",
                format!("{:?} is not one of {}", instrument, config.feed.instruments.join(", "))
            ));
        }

        Ok(Session {
            quantity,
            volatility,
            fee_tier,
            instrument: instrument.to_string(),
        })
    }
}

fn parse_number(name: &str, raw: &str) -> SimulatorResult<f64> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| crate::invalid_param!(name, format!("{:?} is not a number", raw)))?;

    if !value.is_finite() {
        return Err(crate::invalid_param!(name, "must be a finite number"));
    }
    Ok(value)
}
