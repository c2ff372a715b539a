use serde::{Deserialize, Serialize};
use thiserror::Error;

//configuration errors surfaced before any bar is processed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),
    #[error("Unknown position policy: {0}")]
    UnknownPolicy(String),
    #[error("Unknown bar interval: {0}")]
    UnknownInterval(String),
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

//precondition failures, raised before the simulation state is touched
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BacktestError {
    #[error("Price series is empty")]
    EmptySeries,
    #[error("Signal series length ({signals}) does not match price series length ({bars})")]
    LengthMismatch { bars: usize, signals: usize },
    #[error("Initial capital must be positive, got {0}")]
    NonPositiveCapital(f64),
    #[error("Commission rate must be non-negative, got {0}")]
    NegativeCommission(f64),
    #[error("Minimum tradable unit must be positive, got {0}")]
    NonPositiveMinUnit(f64),
}

//per-bar trade rejections; absorbed by the engine and kept in the run's rejection trail
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TradeRejection {
    #[error("Insufficient cash: cost {cost:.8} exceeds available {cash:.8}")]
    InsufficientCash { cost: f64, cash: f64 },
    #[error("Insufficient holdings: cannot sell {quantity:.8} of {held:.8}")]
    InsufficientHoldings { quantity: f64, held: f64 },
    #[error("Quantity {quantity:.8} is below the minimum tradable unit {minimum}")]
    BelowMinimumUnit { quantity: f64, minimum: f64 },
}
