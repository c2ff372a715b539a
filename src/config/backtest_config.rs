use crate::config::params::{PolicyConfig, StrategyParams};
use crate::error::{BacktestError, ConfigError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

//per-run settings handed to the engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub initial_capital: f64,
    pub commission_rate: f64,
    pub min_trade_unit: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            initial_capital: 10000.0,
            commission_rate: 0.001,
            min_trade_unit: 1e-6,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), BacktestError> {
        if self.initial_capital.is_nan() || self.initial_capital <= 0.0 {
            return Err(BacktestError::NonPositiveCapital(self.initial_capital));
        }
        if self.commission_rate.is_nan() || self.commission_rate < 0.0 {
            return Err(BacktestError::NegativeCommission(self.commission_rate));
        }
        if self.min_trade_unit.is_nan() || self.min_trade_unit <= 0.0 {
            return Err(BacktestError::NonPositiveMinUnit(self.min_trade_unit));
        }
        Ok(())
    }
}

//bar frequency, used to annualize per-bar statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BarInterval {
    minutes: u32,
}

const MINUTES_PER_DAY: f64 = 1440.0;
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

impl BarInterval {
    pub fn from_minutes(minutes: u32) -> Result<Self, ConfigError> {
        if minutes == 0 {
            return Err(ConfigError::UnknownInterval("0m".to_string()));
        }
        Ok(BarInterval { minutes })
    }

    //parses exchange-style timeframes such as 1m, 15m, 4h, 1d, 1w
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let s = s.trim();
        let unknown = || ConfigError::UnknownInterval(s.to_string());

        let split = s.find(|c: char| !c.is_ascii_digit()).ok_or_else(unknown)?;
        let (count, unit) = s.split_at(split);
        let count: u32 = count.parse().map_err(|_| unknown())?;

        let per_unit = match unit {
            "m" | "min" => 1,
            "h" | "H" => 60,
            "d" | "D" => 1440,
            "w" | "W" => 10080,
            _ => return Err(unknown()),
        };

        count
            .checked_mul(per_unit)
            .ok_or_else(unknown)
            .and_then(Self::from_minutes)
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    //bars per year assuming 252 trading days, eg 252*24*60 for 1m bars
    pub fn annualization_factor(&self) -> f64 {
        TRADING_DAYS_PER_YEAR * MINUTES_PER_DAY / self.minutes as f64
    }
}

impl Default for BarInterval {
    fn default() -> Self {
        BarInterval { minutes: 60 }
    }
}

impl fmt::Display for BarInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.minutes;
        if m % 10080 == 0 {
            write!(f, "{}w", m / 10080)
        } else if m % 1440 == 0 {
            write!(f, "{}d", m / 1440)
        } else if m % 60 == 0 {
            write!(f, "{}h", m / 60)
        } else {
            write!(f, "{}m", m)
        }
    }
}

impl TryFrom<String> for BarInterval {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        BarInterval::parse(&value)
    }
}

impl From<BarInterval> for String {
    fn from(value: BarInterval) -> Self {
        value.to_string()
    }
}

//complete backtest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfiguration {
    //data
    pub data_path: PathBuf,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub interval: BarInterval,

    //account settings
    #[serde(default)]
    pub run: RunConfig,

    //signal generation and sizing
    pub strategy: StrategyParams,
    pub policy: PolicyConfig,

    //optional output paths
    #[serde(default)]
    pub output_equity_csv: Option<PathBuf>,
    #[serde(default)]
    pub output_trades_csv: Option<PathBuf>,
}

impl Default for BacktestConfiguration {
    fn default() -> Self {
        BacktestConfiguration {
            data_path: PathBuf::from("data.csv"),
            symbol: None,
            interval: BarInterval::default(),
            run: RunConfig::default(),
            strategy: StrategyParams::default(),
            policy: PolicyConfig::default(),
            output_equity_csv: None,
            output_trades_csv: None,
        }
    }
}

impl BacktestConfiguration {
    //load configuration from a JSON file
    pub fn from_json_file(path: &PathBuf) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: BacktestConfiguration = serde_json::from_str(&contents)?;
        Ok(config)
    }

    //save configuration to a JSON file
    pub fn to_json_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
