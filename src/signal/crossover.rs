use crate::config::{KamaParams, MaCrossParams, MacdParams};
use crate::data::{closes, Bar};
use crate::error::ConfigError;
use crate::signal::indicators::{ema, rolling_mean, sma};
use crate::signal::{
    crossover_signals, not_enough_data, require_window, Prediction, Signal, SignalGenerator,
};

//moving-average crossover
//buys when the short sma crosses above the long sma, sells on the reverse cross
#[derive(Debug, Clone)]
pub struct MaCross {
    params: MaCrossParams,
}

impl MaCross {
    pub fn new(params: MaCrossParams) -> Result<Self, ConfigError> {
        require_window("short_window", params.short_window)?;
        require_window("long_window", params.long_window)?;
        if params.short_window >= params.long_window {
            return Err(ConfigError::invalid(
                "short_window",
                format!(
                    "must be below long_window ({} >= {})",
                    params.short_window, params.long_window
                ),
            ));
        }
        Ok(MaCross { params })
    }
}

impl SignalGenerator for MaCross {
    fn generate(&self, bars: &[Bar]) -> Vec<Signal> {
        let closes = closes(bars);
        let short = rolling_mean(&closes, self.params.short_window);
        let long = rolling_mean(&closes, self.params.long_window);
        crossover_signals(&short, &long)
    }

    //solves for the next close that makes both averages equal
    fn predict(&self, bars: &[Bar]) -> Prediction {
        let (s, l) = (self.params.short_window, self.params.long_window);
        if let Some(p) = not_enough_data(bars, l) {
            return p;
        }

        let closes = closes(bars);
        let n = closes.len();
        let (short_now, long_now) = match (sma(&closes[n - s..]), sma(&closes[n - l..])) {
            (Some(a), Some(b)) => (a, b),
            _ => return Prediction::unavailable("averages are undefined"),
        };

        //the next bar drops the oldest close of each window
        let carried_short: f64 = closes[n + 1 - s..].iter().sum();
        let carried_long: f64 = closes[n + 1 - l..].iter().sum();
        let level = (s as f64 * carried_long - l as f64 * carried_short) / (l - s) as f64;

        if short_now <= long_now {
            Prediction::buy_at(level)
        } else {
            Prediction::sell_at(level)
        }
    }

    fn name(&self) -> &str {
        "ma_cross"
    }

    fn lookback(&self) -> usize {
        self.params.long_window
    }
}

//macd line against its signal line
#[derive(Debug, Clone)]
pub struct MacdCross {
    params: MacdParams,
}

struct MacdState {
    macd: Vec<f64>,
    signal: Vec<f64>,
    ema_fast: f64,
    ema_slow: f64,
}

impl MacdCross {
    pub fn new(params: MacdParams) -> Result<Self, ConfigError> {
        require_window("fast", params.fast)?;
        require_window("slow", params.slow)?;
        require_window("signal", params.signal)?;
        if params.fast >= params.slow {
            return Err(ConfigError::invalid("fast", "must be below slow"));
        }
        Ok(MacdCross { params })
    }

    fn compute(&self, closes: &[f64]) -> Option<MacdState> {
        let fast = ema(closes, self.params.fast);
        let slow = ema(closes, self.params.slow);
        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = ema(&macd, self.params.signal);
        Some(MacdState {
            ema_fast: *fast.last()?,
            ema_slow: *slow.last()?,
            macd,
            signal,
        })
    }

    fn alpha(span: usize) -> f64 {
        2.0 / (span as f64 + 1.0)
    }
}

impl SignalGenerator for MacdCross {
    fn generate(&self, bars: &[Bar]) -> Vec<Signal> {
        let Some(state) = self.compute(&closes(bars)) else {
            return Vec::new();
        };
        let warmup = self.lookback() - 1;
        let mask = |series: &[f64]| -> Vec<Option<f64>> {
            series
                .iter()
                .enumerate()
                .map(|(i, v)| (i >= warmup).then_some(*v))
                .collect()
        };
        crossover_signals(&mask(&state.macd), &mask(&state.signal))
    }

    //next close at which the macd line meets its signal line
    fn predict(&self, bars: &[Bar]) -> Prediction {
        if let Some(p) = not_enough_data(bars, self.lookback()) {
            return p;
        }
        let Some(state) = self.compute(&closes(bars)) else {
            return Prediction::unavailable("macd is undefined");
        };
        let (Some(&macd), Some(&signal)) = (state.macd.last(), state.signal.last()) else {
            return Prediction::unavailable("macd is undefined");
        };

        let a_fast = Self::alpha(self.params.fast);
        let a_slow = Self::alpha(self.params.slow);
        let level = (signal - (1.0 - a_fast) * state.ema_fast + (1.0 - a_slow) * state.ema_slow)
            / (a_fast - a_slow);

        if macd <= signal {
            Prediction::buy_at(level)
        } else {
            Prediction::sell_at(level)
        }
    }

    fn name(&self) -> &str {
        "macd_cross"
    }

    fn lookback(&self) -> usize {
        self.params.slow + self.params.signal - 1
    }
}

//kaufman adaptive moving average against a fixed-window sma
#[derive(Debug, Clone)]
pub struct KamaCross {
    params: KamaParams,
}

impl KamaCross {
    pub fn new(params: KamaParams) -> Result<Self, ConfigError> {
        require_window("fast", params.fast)?;
        require_window("window", params.window)?;
        if params.slow <= params.fast {
            return Err(ConfigError::invalid("slow", "must be above fast"));
        }
        Ok(KamaCross { params })
    }

    //seeded with the close at the end of the first window
    fn kama(&self, closes: &[f64]) -> Vec<Option<f64>> {
        let window = self.params.window;
        let fast_sc = 2.0 / (self.params.fast as f64 + 1.0);
        let slow_sc = 2.0 / (self.params.slow as f64 + 1.0);

        let mut out = vec![None; closes.len()];
        let mut prev: Option<f64> = None;
        for i in (window - 1)..closes.len() {
            let next = match prev {
                None => closes[i],
                Some(k) => {
                    let change = (closes[i] - closes[i - window]).abs();
                    let volatility: f64 = closes[i + 1 - window..=i]
                        .iter()
                        .zip(&closes[i - window..i])
                        .map(|(c, p)| (c - p).abs())
                        .sum();
                    let efficiency = if volatility > 0.0 {
                        change / volatility
                    } else {
                        0.0
                    };
                    let sc = (efficiency * (fast_sc - slow_sc) + slow_sc).powi(2);
                    k + sc * (closes[i] - k)
                }
            };
            out[i] = Some(next);
            prev = Some(next);
        }
        out
    }
}

impl SignalGenerator for KamaCross {
    fn generate(&self, bars: &[Bar]) -> Vec<Signal> {
        let closes = closes(bars);
        let kama = self.kama(&closes);
        let ma = rolling_mean(&closes, self.params.window);
        crossover_signals(&kama, &ma)
    }

    //kama tracks price closely, so the sma itself is the trigger estimate
    fn predict(&self, bars: &[Bar]) -> Prediction {
        if let Some(p) = not_enough_data(bars, self.lookback()) {
            return p;
        }
        let closes = closes(bars);
        let n = closes.len();
        let Some(ma) = sma(&closes[n - self.params.window..]) else {
            return Prediction::unavailable("average is undefined");
        };
        if closes[n - 1] < ma {
            Prediction::buy_at(ma)
        } else {
            Prediction::sell_at(ma)
        }
    }

    fn name(&self) -> &str {
        "kama_cross"
    }

    fn lookback(&self) -> usize {
        self.params.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::test_support::bars_from_closes;

    fn ma(short: usize, long: usize) -> MaCross {
        MaCross::new(MaCrossParams {
            short_window: short,
            long_window: long,
        })
        .unwrap()
    }

    #[test]
    fn rejects_inverted_windows() {
        assert!(MaCross::new(MaCrossParams {
            short_window: 20,
            long_window: 5
        })
        .is_err());
        assert!(MacdCross::new(MacdParams {
            fast: 26,
            slow: 12,
            signal: 9
        })
        .is_err());
    }

    #[test]
    fn rising_series_crosses_once() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let signals = ma(3, 8).generate(&bars_from_closes(&closes));

        let buys: Vec<usize> = signals
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == Signal::Buy)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(buys, vec![7]);
        assert!(!signals.contains(&Signal::Sell));
    }

    #[test]
    fn reversal_produces_sell() {
        let mut closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        closes.extend((0..20).map(|i| 119.0 - 2.0 * i as f64));
        let signals = ma(3, 8).generate(&bars_from_closes(&closes));
        assert_eq!(signals.iter().filter(|s| **s == Signal::Sell).count(), 1);
        let sell_at = signals.iter().position(|s| *s == Signal::Sell).unwrap();
        assert!(sell_at > 20);
    }

    #[test]
    fn ma_prediction_equalizes_averages() {
        let closes: Vec<f64> = (0..30).map(|i| 200.0 - i as f64).collect();
        let strategy = ma(3, 8);
        let prediction = strategy.predict(&bars_from_closes(&closes));
        let level = prediction.next_buy_price.unwrap();

        let mut extended = closes.clone();
        extended.push(level);
        let n = extended.len();
        let short = sma(&extended[n - 3..]).unwrap();
        let long = sma(&extended[n - 8..]).unwrap();
        assert!((short - long).abs() < 1e-9);
    }

    #[test]
    fn macd_prediction_meets_signal_line() {
        let closes: Vec<f64> = (0..80)
            .map(|i| 100.0 + 5.0 * (i as f64 / 6.0).sin())
            .collect();
        let strategy = MacdCross::new(MacdParams::default()).unwrap();
        let prediction = strategy.predict(&bars_from_closes(&closes));
        let level = prediction
            .next_buy_price
            .or(prediction.next_sell_price)
            .unwrap();

        let mut extended = closes.clone();
        extended.push(level);
        let state = strategy.compute(&extended).unwrap();
        let last = extended.len() - 1;
        assert!((state.macd[last] - state.signal[last]).abs() < 1e-6);
    }

    #[test]
    fn macd_is_quiet_during_warmup() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + 5.0 * (i as f64 / 3.0).sin())
            .collect();
        let strategy = MacdCross::new(MacdParams::default()).unwrap();
        let signals = strategy.generate(&bars_from_closes(&closes));
        assert!(signals[..strategy.lookback() - 1]
            .iter()
            .all(|s| *s == Signal::Hold));
        assert!(signals.iter().any(|s| s.is_action()));
    }

    #[test]
    fn kama_is_undefined_before_window() {
        let strategy = KamaCross::new(KamaParams::default()).unwrap();
        let closes: Vec<f64> = (0..15).map(|i| 50.0 + i as f64).collect();
        let kama = strategy.kama(&closes);
        assert!(kama[..9].iter().all(|k| k.is_none()));
        assert_eq!(kama[9], Some(closes[9]));
        //a perfectly efficient trend moves kama toward price at the fast constant
        let fast_sc: f64 = (2.0 / 3.0_f64).powi(2);
        let expected = closes[9] + fast_sc * (closes[10] - closes[9]);
        assert!((kama[10].unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn kama_survives_flat_prices() {
        let strategy = KamaCross::new(KamaParams::default()).unwrap();
        let signals = strategy.generate(&bars_from_closes(&[10.0; 30]));
        assert!(signals.iter().all(|s| *s == Signal::Hold));
    }
}
