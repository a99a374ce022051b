// Reconnection policy with capped exponential backoff

use rand::Rng;
use std::time::Duration;

use crate::config::ReconnectConfig;

/// How a dropped feed connection is retried.
///
/// The default never retries: a dropped connection stays dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f64,
    jitter: bool,
}

impl ReconnectPolicy {
    pub fn new(
        max_retries: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
        jitter: bool,
    ) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
            backoff_multiplier,
            jitter,
        }
    }

    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO, 1.0, false)
    }

    pub fn from_config(config: &ReconnectConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.backoff_multiplier,
            config.jitter,
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.max_retries > 0
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `attempt` (0-based), or `None` once retries
    /// are exhausted. With jitter the delay is scaled into `[50%, 100%]`.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }

        let exponential = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        let capped = exponential.min(self.max_delay.as_secs_f64());

        let scaled = if self.jitter {
            capped * rand::thread_rng().gen_range(0.5..=1.0)
        } else {
            capped
        };

        Some(Duration::from_secs_f64(scaled))
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}
