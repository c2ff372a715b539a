use crate::config::{BollingerParams, MeanReversionParams};
use crate::data::{closes, Bar};
use crate::error::ConfigError;
use crate::signal::indicators::{last, rolling_mean, rolling_std};
use crate::signal::{
    broke_above, broke_below, not_enough_data, threshold_signals, Prediction, Signal,
    SignalGenerator,
};

fn require_band(window: usize, width: f64, name: &'static str) -> Result<(), ConfigError> {
    if window < 2 {
        return Err(ConfigError::invalid(
            "window",
            "a deviation band needs at least 2 bars",
        ));
    }
    if width.is_nan() || width <= 0.0 {
        return Err(ConfigError::invalid(name, "must be positive"));
    }
    Ok(())
}

//bollinger band breakout
//buys when close crosses above the upper band, sells when it crosses below the lower band
#[derive(Debug, Clone)]
pub struct BollingerBreakout {
    params: BollingerParams,
}

impl BollingerBreakout {
    pub fn new(params: BollingerParams) -> Result<Self, ConfigError> {
        require_band(params.window, params.num_std, "num_std")?;
        Ok(BollingerBreakout { params })
    }

    fn bands(&self, closes: &[f64]) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
        let ma = rolling_mean(closes, self.params.window);
        let std = rolling_std(closes, self.params.window);
        let k = self.params.num_std;
        ma.iter()
            .zip(&std)
            .map(|(m, s)| match (m, s) {
                (Some(m), Some(s)) => (Some(m + k * s), Some(m - k * s)),
                _ => (None, None),
            })
            .unzip()
    }
}

impl SignalGenerator for BollingerBreakout {
    fn generate(&self, bars: &[Bar]) -> Vec<Signal> {
        let closes = closes(bars);
        let (upper, lower) = self.bands(&closes);

        let mut prev_upper = None;
        let mut prev_lower = None;
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let cur_upper = upper[i].map(|u| (close, u));
                let cur_lower = lower[i].map(|l| (close, l));
                let signal = if broke_above(prev_upper, cur_upper) {
                    Signal::Buy
                } else if broke_below(prev_lower, cur_lower) {
                    Signal::Sell
                } else {
                    Signal::Hold
                };
                prev_upper = cur_upper;
                prev_lower = cur_lower;
                signal
            })
            .collect()
    }

    fn predict(&self, bars: &[Bar]) -> Prediction {
        if let Some(p) = not_enough_data(bars, self.lookback()) {
            return p;
        }
        let closes = closes(bars);
        let (upper, lower) = self.bands(&closes);
        let (Some(upper), Some(lower)) = (last(&upper), last(&lower)) else {
            return Prediction::unavailable("bands are undefined");
        };
        if upper == lower {
            return Prediction::unavailable("zero volatility, bands have collapsed");
        }
        if closes[closes.len() - 1] < upper {
            Prediction::buy_at(upper)
        } else {
            Prediction::sell_at(lower)
        }
    }

    fn name(&self) -> &str {
        "bollinger_breakout"
    }

    fn lookback(&self) -> usize {
        self.params.window
    }
}

//rolling z-score mean reversion
//buys more than `threshold` deviations below the mean, sells the same distance above
#[derive(Debug, Clone)]
pub struct MeanReversion {
    params: MeanReversionParams,
}

impl MeanReversion {
    pub fn new(params: MeanReversionParams) -> Result<Self, ConfigError> {
        require_band(params.window, params.threshold, "threshold")?;
        Ok(MeanReversion { params })
    }

    fn zscores(&self, closes: &[f64]) -> Vec<Option<f64>> {
        let ma = rolling_mean(closes, self.params.window);
        let std = rolling_std(closes, self.params.window);
        closes
            .iter()
            .zip(ma.iter().zip(&std))
            .map(|(c, stats)| match stats {
                (Some(m), Some(s)) if *s > 0.0 => Some((c - m) / s),
                _ => None,
            })
            .collect()
    }
}

impl SignalGenerator for MeanReversion {
    fn generate(&self, bars: &[Bar]) -> Vec<Signal> {
        let z = self.zscores(&closes(bars));
        threshold_signals(&z, -self.params.threshold, self.params.threshold)
    }

    //the entry levels of the current window
    fn predict(&self, bars: &[Bar]) -> Prediction {
        if let Some(p) = not_enough_data(bars, self.lookback()) {
            return p;
        }
        let closes = closes(bars);
        let mean = last(&rolling_mean(&closes, self.params.window));
        let std = last(&rolling_std(&closes, self.params.window));
        match (mean, std) {
            (Some(m), Some(s)) if s > 0.0 => {
                let offset = self.params.threshold * s;
                Prediction::both(m - offset, m + offset)
            }
            (Some(_), Some(_)) => Prediction::unavailable("zero volatility, z-score undefined"),
            _ => Prediction::unavailable("rolling statistics are undefined"),
        }
    }

    fn name(&self) -> &str {
        "mean_reversion"
    }

    fn lookback(&self) -> usize {
        self.params.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::test_support::bars_from_closes;

    fn bollinger() -> BollingerBreakout {
        BollingerBreakout::new(BollingerParams {
            window: 5,
            num_std: 1.0,
        })
        .unwrap()
    }

    #[test]
    fn bollinger_breakouts() {
        let closes = [
            100.0, 101.0, 100.0, 101.0, 100.0, 101.0, 110.0, 111.0, 100.0, 90.0,
        ];
        let signals = bollinger().generate(&bars_from_closes(&closes));
        assert_eq!(signals[6], Signal::Buy);
        assert_eq!(signals[7], Signal::Hold);
        assert!(signals[..4].iter().all(|s| *s == Signal::Hold));
        assert!(signals.contains(&Signal::Sell));
    }

    #[test]
    fn spike_on_the_first_defined_band_is_not_a_breakout() {
        let mut closes = vec![100.0; 19];
        closes.push(200.0);
        let strategy = BollingerBreakout::new(BollingerParams::default()).unwrap();
        let signals = strategy.generate(&bars_from_closes(&closes));
        assert!(signals.iter().all(|s| *s == Signal::Hold));
    }

    #[test]
    fn bollinger_prediction_on_flat_prices_is_unavailable() {
        let prediction = bollinger().predict(&bars_from_closes(&[50.0; 10]));
        assert!(prediction.is_empty());
        assert!(prediction.message.unwrap().contains("zero volatility"));
    }

    #[test]
    fn bollinger_prediction_points_at_upper_band() {
        let closes = [100.0, 102.0, 98.0, 101.0, 99.0];
        let prediction = bollinger().predict(&bars_from_closes(&closes));
        assert!(prediction.next_buy_price.unwrap() > 100.0);
    }

    #[test]
    fn rejects_degenerate_band() {
        assert!(BollingerBreakout::new(BollingerParams {
            window: 1,
            num_std: 2.0
        })
        .is_err());
        assert!(MeanReversion::new(MeanReversionParams {
            window: 20,
            threshold: 0.0
        })
        .is_err());
    }

    #[test]
    fn zscore_extremes_trigger_reversion() {
        let mut closes = vec![100.0, 101.0, 99.0, 100.0, 101.0, 99.0];
        closes.push(90.0);
        closes.push(100.0);
        closes.push(112.0);
        let strategy = MeanReversion::new(MeanReversionParams {
            window: 6,
            threshold: 1.5,
        })
        .unwrap();
        let signals = strategy.generate(&bars_from_closes(&closes));
        assert_eq!(signals[6], Signal::Buy);
        assert_eq!(signals[8], Signal::Sell);
    }

    #[test]
    fn zscore_prediction_brackets_the_mean() {
        let closes = [100.0, 101.0, 99.0, 100.0, 101.0, 99.0];
        let strategy = MeanReversion::new(MeanReversionParams {
            window: 6,
            threshold: 1.0,
        })
        .unwrap();
        let prediction = strategy.predict(&bars_from_closes(&closes));
        let buy = prediction.next_buy_price.unwrap();
        let sell = prediction.next_sell_price.unwrap();
        assert!(buy < 100.0 && sell > 100.0);
        assert!(((buy + sell) / 2.0 - 100.0).abs() < 1e-9);
    }

    #[test]
    fn flat_prices_never_signal() {
        let strategy = MeanReversion::new(MeanReversionParams::default()).unwrap();
        let signals = strategy.generate(&bars_from_closes(&[10.0; 40]));
        assert!(signals.iter().all(|s| *s == Signal::Hold));
    }
}
