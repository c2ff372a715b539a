use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BarError {
    #[error("Invalid OHLC values: high ({high}) < low ({low})")]
    InvalidHighLow { high: f64, low: f64 },
    #[error("Invalid OHLC values: close ({close}) outside high-low range [{low}, {high}]")]
    InvalidClose { close: f64, high: f64, low: f64 },
    #[error("Invalid OHLC values: open ({open}) outside high-low range [{low}, {high}]")]
    InvalidOpen { open: f64, high: f64, low: f64 },
    #[error("Negative volume: {0}")]
    NegativeVolume(f64),
}

//one ohlcv sample of a single instrument at a fixed interval
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    //creates a new Bar with validation
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, BarError> {
        if high < low {
            return Err(BarError::InvalidHighLow { high, low });
        }

        if close < low || close > high {
            return Err(BarError::InvalidClose { close, high, low });
        }

        if open < low || open > high {
            return Err(BarError::InvalidOpen { open, high, low });
        }

        if volume < 0.0 {
            return Err(BarError::NegativeVolume(volume));
        }

        Ok(Self::new_unchecked(timestamp, open, high, low, close, volume))
    }

    //creates a Bar without validation, the data collaborator is trusted
    pub fn new_unchecked(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    //a bar whose open, high, low and close all equal one price
    pub fn flat(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self::new_unchecked(timestamp, price, price, price, price, 0.0)
    }
}

//extracts the close prices of a bar slice
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn rejects_high_below_low() {
        let err = Bar::new(ts(), 10.0, 9.0, 11.0, 10.0, 1.0).unwrap_err();
        assert!(matches!(err, BarError::InvalidHighLow { .. }));
    }

    #[test]
    fn rejects_close_outside_range() {
        let err = Bar::new(ts(), 10.0, 11.0, 9.0, 12.0, 1.0).unwrap_err();
        assert!(matches!(err, BarError::InvalidClose { .. }));
    }

    #[test]
    fn rejects_negative_volume() {
        let err = Bar::new(ts(), 10.0, 11.0, 9.0, 10.0, -1.0).unwrap_err();
        assert!(matches!(err, BarError::NegativeVolume(_)));
    }

    #[test]
    fn accepts_valid_bar() {
        let bar = Bar::new(ts(), 10.0, 11.0, 9.0, 10.5, 100.0).unwrap();
        assert_eq!((bar.high, bar.low), (11.0, 9.0));
        assert_eq!(closes(&[bar]), vec![10.5]);
    }
}
