//! Unified error handling for the transaction cost simulator
//!
//! Hot-path failures (bad ticks, undecodable frames) never surface here: they
//! degrade to an unavailable estimate or a dropped frame. This type covers the
//! cold paths - configuration, session start, telemetry setup and the feed
//! connection itself.

use std::fmt;
use std::io;

use crate::config::ConfigError;

/// Main error type for the simulator
#[derive(Debug)]
pub enum SimulatorError {
    // Configuration errors
    ConfigNotFound(String),
    ConfigParse(String),
    ConfigValidation(String),

    // Session parameter errors
    InvalidParameter(String, String), // (parameter_name, reason)

    // Feed errors
    FeedConnection(String),
    FeedDecode(String),
    RuntimeUnavailable(String),

    // Telemetry / IO errors
    TelemetryIo(String),
    FileNotFound(String),
    FileWrite(String),

    // General errors
    Internal(String),
}

impl SimulatorError {
    /// Get a user-friendly error message with helpful context
    pub fn user_message(&self) -> String {
        match self {
            SimulatorError::ConfigNotFound(path) => {
                format!(
                    "Configuration file not found: {}\n\n\
                    💡 Quick fix:\n\
                    1. Run: cost-sim init\n\
                    2. Adjust config.toml if needed\n\
                    3. Try again",
                    path
                )
            }
            SimulatorError::InvalidParameter(param, reason) => {
                format!(
                    "Invalid session parameter '{}': {}\n\n\
                    💡 Check:\n\
                    - Quantity is a positive number (USD notional)\n\
                    - Volatility is a non-negative number\n\
                    - Asset is one of the configured instruments",
                    param, reason
                )
            }
            SimulatorError::TelemetryIo(msg) => {
                format!(
                    "Latency log could not be written: {}\n\n\
                    💡 Check the telemetry.log_file path and directory permissions",
                    msg
                )
            }
            _ => self.to_string(),
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, SimulatorError::FeedConnection(_))
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            SimulatorError::ConfigNotFound(_)
            | SimulatorError::ConfigParse(_)
            | SimulatorError::ConfigValidation(_) => "config",

            SimulatorError::InvalidParameter(_, _) => "validation",

            SimulatorError::FeedConnection(_)
            | SimulatorError::FeedDecode(_)
            | SimulatorError::RuntimeUnavailable(_) => "feed",

            SimulatorError::TelemetryIo(_)
            | SimulatorError::FileNotFound(_)
            | SimulatorError::FileWrite(_) => "io",

            SimulatorError::Internal(_) => "internal",
        }
    }
}

impl fmt::Display for SimulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulatorError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path)
            }
            SimulatorError::ConfigParse(msg) => {
                write!(f, "Configuration parse error: {}", msg)
            }
            SimulatorError::ConfigValidation(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }

            SimulatorError::InvalidParameter(param, reason) => {
                write!(f, "Invalid parameter '{}': {}", param, reason)
            }

            SimulatorError::FeedConnection(msg) => {
                write!(f, "Feed connection error: {}", msg)
            }
            SimulatorError::FeedDecode(msg) => {
                write!(f, "Feed decode error: {}", msg)
            }
            SimulatorError::RuntimeUnavailable(msg) => {
                write!(f, "Async runtime unavailable: {}", msg)
            }

            SimulatorError::TelemetryIo(msg) => {
                write!(f, "Telemetry I/O error: {}", msg)
            }
            SimulatorError::FileNotFound(path) => {
                write!(f, "File not found: {}", path)
            }
            SimulatorError::FileWrite(msg) => {
                write!(f, "File write error: {}", msg)
            }

            SimulatorError::Internal(msg) => {
                write!(f, "Internal error: {}", msg)
            }
        }
    }
}

impl std::error::Error for SimulatorError {}

// Conversion implementations for common error types

impl From<io::Error> for SimulatorError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => SimulatorError::FileNotFound(err.to_string()),
            io::ErrorKind::PermissionDenied => SimulatorError::FileWrite(err.to_string()),
            io::ErrorKind::ConnectionRefused | io::ErrorKind::TimedOut => {
                SimulatorError::FeedConnection(err.to_string())
            }
            _ => SimulatorError::Internal(format!("IO error: {}", err)),
        }
    }
}

impl From<serde_json::Error> for SimulatorError {
    fn from(err: serde_json::Error) -> Self {
        SimulatorError::FeedDecode(format!("JSON parse error: {}", err))
    }
}

impl From<toml::de::Error> for SimulatorError {
    fn from(err: toml::de::Error) -> Self {
        SimulatorError::ConfigParse(format!("TOML parse error: {}", err))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SimulatorError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        SimulatorError::FeedConnection(err.to_string())
    }
}

impl From<ConfigError> for SimulatorError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::FileRead(msg) => SimulatorError::ConfigNotFound(msg),
            ConfigError::FileWrite(msg) => SimulatorError::FileWrite(msg),
            ConfigError::Parse(msg) | ConfigError::Serialize(msg) => {
                SimulatorError::ConfigParse(msg)
            }
            ConfigError::Validation(msg) => SimulatorError::ConfigValidation(msg),
        }
    }
}

/// Result type alias using SimulatorError
pub type SimulatorResult<T> = Result<T, SimulatorError>;

/// Shorthand for an `InvalidParameter` error
#[macro_export]
macro_rules! invalid_param {
    ($param:expr, $reason:expr) => {
        $crate::error::SimulatorError::InvalidParameter($param.to_string(), $reason.to_string())
    };
}
