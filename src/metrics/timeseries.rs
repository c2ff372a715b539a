use crate::signal::Signal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//a point in the equity curve, recorded once per bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquitySnapshot {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
    pub price: f64,
    pub position_quantity: f64,
    pub signal: Signal,
}

impl EquitySnapshot {
    pub fn new(
        timestamp: DateTime<Utc>,
        equity: f64,
        price: f64,
        position_quantity: f64,
        signal: Signal,
    ) -> Self {
        EquitySnapshot {
            timestamp,
            equity,
            price,
            position_quantity,
            signal,
        }
    }
}

//relative decline from the running peak at each point, non-positive
pub fn drawdown_series(equity_values: &[f64]) -> Vec<f64> {
    let mut peak = f64::MIN;
    equity_values
        .iter()
        .map(|&equity| {
            peak = peak.max(equity);
            if peak > 0.0 {
                (equity - peak) / peak
            } else {
                0.0
            }
        })
        .collect()
}

//calculates maximum drawdown from equity values (most negative drawdown)
pub fn max_drawdown(equity_values: &[f64]) -> f64 {
    drawdown_series(equity_values)
        .into_iter()
        .fold(0.0, f64::min)
}

//calculates bar-to-bar returns from equity values
//a bar starting from zero equity contributes no return
pub fn calculate_returns(equity_values: &[f64]) -> Vec<f64> {
    equity_values
        .windows(2)
        .map(|w| if w[0] != 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

pub fn equity_values(curve: &[EquitySnapshot]) -> Vec<f64> {
    curve.iter().map(|p| p.equity).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawdown_tracks_running_peak() {
        let dd = drawdown_series(&[100.0, 120.0, 90.0, 130.0, 117.0]);
        assert_eq!(dd[0], 0.0);
        assert_eq!(dd[1], 0.0);
        assert!((dd[2] + 0.25).abs() < 1e-12);
        assert_eq!(dd[3], 0.0);
        assert!((dd[4] + 0.1).abs() < 1e-12);
        assert!((max_drawdown(&[100.0, 120.0, 90.0, 130.0, 117.0]) + 0.25).abs() < 1e-12);
    }

    #[test]
    fn monotonic_curve_has_no_drawdown() {
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn returns_are_relative_changes() {
        let r = calculate_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.1).abs() < 1e-12);
        assert!((r[1] + 0.1).abs() < 1e-12);
        assert!(calculate_returns(&[5.0]).is_empty());
    }
}
