// Configuration management for the transaction cost simulator

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::models::{ImpactParams, MakerTakerParams, SlippageCoefficients};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,
    pub venue: String,
    pub instrument_suffix: String,
    pub instruments: Vec<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "wss://ws.gomarket-cpp.goquant.io".to_string(),
            venue: "okx".to_string(),
            instrument_suffix: "-SWAP".to_string(),
            instruments: vec![
                "BTC-USDT".to_string(),
                "ETH-USDT".to_string(),
                "SOL-USDT".to_string(),
            ],
        }
    }
}

impl FeedConfig {
    /// Feed symbol for a spot instrument, e.g. `BTC-USDT` -> `BTC-USDT-SWAP`
    pub fn symbol_for(&self, instrument: &str) -> String {
        format!("{}{}", instrument, self.instrument_suffix)
    }

    /// Full L2 order-book stream URL for an instrument
    pub fn url_for(&self, instrument: &str) -> String {
        format!(
            "{}/ws/l2-orderbook/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.venue,
            self.symbol_for(instrument)
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub impact: ImpactParams,
    pub slippage: SlippageCoefficients,
    pub maker_taker: MakerTakerParams,
}

/// Maker/taker fee pair for one tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeRates {
    pub maker: f64,
    pub taker: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    pub tier1: FeeRates,
    pub tier2: FeeRates,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            tier1: FeeRates { maker: 0.0010, taker: 0.0015 },
            tier2: FeeRates { maker: 0.0008, taker: 0.0012 },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Reject fee tier labels other than "Tier 1" / "Tier 2" instead of
    /// falling back to Tier 2
    pub strict_fee_tier: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_file: String,
    pub flush_interval_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_file: "latency_log.csv".to_string(),
            flush_interval_ms: 1000,
        }
    }
}

impl TelemetryConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// 0 keeps the feed's historical behavior: a dropped connection stays dropped
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_tick_latency: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_tick_latency: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub models: ModelConfig,
    pub fees: FeeSchedule,
    pub session: SessionConfig,
    pub telemetry: TelemetryConfig,
    pub reconnect: ReconnectConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(e.to_string()))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(path, content)
            .map_err(|e| ConfigError::FileWrite(e.to_string()))?;

        Ok(())
    }

    /// Load configuration from file, or create default if file doesn't exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            let config = Self::default();
            config.to_file(&path)?;
            tracing::info!("📁 Created default config file: {}", path.as_ref().display());
            Ok(config)
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.base_url.is_empty() {
            return Err(ConfigError::Validation("feed.base_url must not be empty".to_string()));
        }

        if self.feed.instruments.is_empty() {
            return Err(ConfigError::Validation("feed.instruments must list at least one instrument".to_string()));
        }

        self.models.impact.validate().map_err(ConfigError::Validation)?;
        self.models.maker_taker.validate().map_err(ConfigError::Validation)?;

        for (name, rates) in [("tier1", &self.fees.tier1), ("tier2", &self.fees.tier2)] {
            if rates.maker < 0.0 || rates.taker < 0.0 {
                return Err(ConfigError::Validation(format!("fees.{} rates must be non-negative", name)));
            }
        }

        if self.telemetry.log_file.is_empty() {
            return Err(ConfigError::Validation("telemetry.log_file must not be empty".to_string()));
        }

        if self.telemetry.flush_interval_ms == 0 {
            return Err(ConfigError::Validation("telemetry.flush_interval_ms must be greater than 0".to_string()));
        }

        if self.reconnect.backoff_multiplier < 1.0 {
            return Err(ConfigError::Validation("reconnect.backoff_multiplier must be at least 1.0".to_string()));
        }

        if self.reconnect.base_delay_ms > self.reconnect.max_delay_ms {
            return Err(ConfigError::Validation("reconnect.base_delay_ms must not exceed max_delay_ms".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(String),

    #[error("Failed to write config file: {0}")]
    FileWrite(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}
