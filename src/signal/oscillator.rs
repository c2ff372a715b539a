use crate::config::{KdjParams, MomentumParams, RsiParams};
use crate::data::{closes, Bar};
use crate::error::ConfigError;
use crate::signal::indicators::{self, ewm, pct_change, rolling_max, rolling_min};
use crate::signal::{
    crossover_signals, not_enough_data, require_window, threshold_signals, Prediction, Signal,
    SignalGenerator,
};

//rsi overbought/oversold
//buys while rsi sits below the oversold line, sells while above the overbought line
#[derive(Debug, Clone)]
pub struct RsiSignal {
    params: RsiParams,
}

impl RsiSignal {
    pub fn new(params: RsiParams) -> Result<Self, ConfigError> {
        require_window("period", params.period)?;
        if params.oversold >= params.overbought {
            return Err(ConfigError::invalid(
                "oversold",
                "must be below overbought",
            ));
        }
        Ok(RsiSignal { params })
    }
}

impl SignalGenerator for RsiSignal {
    fn generate(&self, bars: &[Bar]) -> Vec<Signal> {
        let rsi = indicators::rsi(&closes(bars), self.params.period);
        threshold_signals(&rsi, self.params.oversold, self.params.overbought)
    }

    //assumes a 5% move brings rsi back across the band
    fn predict(&self, bars: &[Bar]) -> Prediction {
        if let Some(p) = not_enough_data(bars, self.lookback()) {
            return p;
        }
        let closes = closes(bars);
        let price = closes[closes.len() - 1];
        match indicators::last(&indicators::rsi(&closes, self.params.period)) {
            None => Prediction::unavailable("rsi is undefined for a motionless window"),
            Some(rsi) if rsi > self.params.overbought => Prediction::sell_at(price * 0.95),
            Some(rsi) if rsi < self.params.oversold => Prediction::buy_at(price * 1.05),
            Some(rsi) => Prediction::unavailable(format!("rsi {:.1} is inside the band", rsi)),
        }
    }

    fn name(&self) -> &str {
        "rsi_signal"
    }

    fn lookback(&self) -> usize {
        self.params.period + 1
    }
}

//stochastic k/d crossover (kdj)
#[derive(Debug, Clone)]
pub struct KdjSignal {
    params: KdjParams,
}

impl KdjSignal {
    pub fn new(params: KdjParams) -> Result<Self, ConfigError> {
        require_window("n", params.n)?;
        require_window("k_period", params.k_period)?;
        require_window("d_period", params.d_period)?;
        Ok(KdjSignal { params })
    }

    //returns the k and d lines
    fn lines(&self, bars: &[Bar]) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let high_max = rolling_max(&highs, self.params.n);
        let low_min = rolling_min(&lows, self.params.n);

        //a window with no range sits mid-scale
        let rsv: Vec<Option<f64>> = bars
            .iter()
            .zip(high_max.iter().zip(&low_min))
            .map(|(bar, range)| match range {
                (Some(hi), Some(lo)) if hi > lo => Some((bar.close - lo) / (hi - lo) * 100.0),
                (Some(_), Some(_)) => Some(50.0),
                _ => None,
            })
            .collect();

        let k = ewm(&rsv, 1.0 / self.params.k_period as f64);
        let d = ewm(&k, 1.0 / self.params.d_period as f64);
        (k, d)
    }
}

impl SignalGenerator for KdjSignal {
    fn generate(&self, bars: &[Bar]) -> Vec<Signal> {
        let (k, d) = self.lines(bars);
        crossover_signals(&k, &d)
    }

    //assumes a 1% move is enough for k to cross d
    fn predict(&self, bars: &[Bar]) -> Prediction {
        if let Some(p) = not_enough_data(bars, self.lookback()) {
            return p;
        }
        let (k, d) = self.lines(bars);
        let price = bars[bars.len() - 1].close;
        match (indicators::last(&k), indicators::last(&d)) {
            (Some(k), Some(d)) if k < d => Prediction::buy_at(price * 1.01),
            (Some(_), Some(_)) => Prediction::sell_at(price * 0.99),
            _ => Prediction::unavailable("stochastic lines are undefined"),
        }
    }

    fn name(&self) -> &str {
        "kdj_signal"
    }

    fn lookback(&self) -> usize {
        self.params.n
    }
}

//trailing-return momentum
//buys when the return over `window` bars beats +threshold, sells below -threshold
#[derive(Debug, Clone)]
pub struct Momentum {
    params: MomentumParams,
}

impl Momentum {
    pub fn new(params: MomentumParams) -> Result<Self, ConfigError> {
        require_window("window", params.window)?;
        if params.threshold.is_nan() || params.threshold < 0.0 {
            return Err(ConfigError::invalid("threshold", "must be non-negative"));
        }
        Ok(Momentum { params })
    }
}

impl SignalGenerator for Momentum {
    fn generate(&self, bars: &[Bar]) -> Vec<Signal> {
        let threshold = self.params.threshold;
        pct_change(&closes(bars), self.params.window)
            .into_iter()
            .map(|m| match m {
                Some(m) if m > threshold => Signal::Buy,
                Some(m) if m < -threshold => Signal::Sell,
                _ => Signal::Hold,
            })
            .collect()
    }

    //the next bar's return is measured against the close `window - 1` bars back
    fn predict(&self, bars: &[Bar]) -> Prediction {
        if let Some(p) = not_enough_data(bars, self.lookback()) {
            return p;
        }
        let closes = closes(bars);
        let n = closes.len();
        let threshold = self.params.threshold;
        let Some(current) = indicators::last(&pct_change(&closes, self.params.window)) else {
            return Prediction::unavailable("momentum is undefined");
        };
        let reference = closes[n - self.params.window];

        if current <= threshold {
            Prediction::buy_at(reference * (1.0 + threshold))
        } else {
            Prediction::sell_at(reference * (1.0 - threshold))
        }
    }

    fn name(&self) -> &str {
        "momentum"
    }

    fn lookback(&self) -> usize {
        self.params.window + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::test_support::bars_from_closes;

    #[test]
    fn rsi_buys_in_a_selloff_and_sells_in_a_rally() {
        let mut closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        closes.extend((0..20).map(|i| 81.0 + 2.0 * i as f64));
        let signals = RsiSignal::new(RsiParams::default())
            .unwrap()
            .generate(&bars_from_closes(&closes));

        assert_eq!(signals[15], Signal::Buy);
        assert_eq!(signals[39], Signal::Sell);
        assert!(signals[..14].iter().all(|s| *s == Signal::Hold));
    }

    #[test]
    fn rsi_prediction_in_the_oversold_zone() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let prediction = RsiSignal::new(RsiParams::default())
            .unwrap()
            .predict(&bars_from_closes(&closes));
        assert!((prediction.next_buy_price.unwrap() - 81.0 * 1.05).abs() < 1e-9);
        assert!(prediction.next_sell_price.is_none());
    }

    #[test]
    fn rsi_prediction_without_movement_is_unavailable() {
        let prediction = RsiSignal::new(RsiParams::default())
            .unwrap()
            .predict(&bars_from_closes(&[100.0; 20]));
        assert!(prediction.is_empty());
        assert!(prediction.message.is_some());
    }

    #[test]
    fn kdj_crosses_on_turns() {
        let mut closes: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        closes.extend((0..15).map(|i| 86.0 + i as f64));
        let signals = KdjSignal::new(KdjParams::default())
            .unwrap()
            .generate(&bars_from_closes(&closes));
        let first_buy = signals.iter().position(|s| *s == Signal::Buy).unwrap();
        assert!(first_buy >= 15);
    }

    #[test]
    fn kdj_flat_window_is_mid_scale() {
        let strategy = KdjSignal::new(KdjParams::default()).unwrap();
        let flat: Vec<Bar> = bars_from_closes(&[10.0; 12])
            .into_iter()
            .map(|b| Bar::flat(b.timestamp, 10.0))
            .collect();
        let (k, d) = strategy.lines(&flat);
        assert_eq!(k[11], Some(50.0));
        assert_eq!(d[11], Some(50.0));
    }

    #[test]
    fn momentum_thresholds() {
        let closes = [100.0, 100.0, 110.0, 90.0, 110.0];
        let strategy = Momentum::new(MomentumParams {
            window: 2,
            threshold: 0.05,
        })
        .unwrap();
        let signals = strategy.generate(&bars_from_closes(&closes));
        assert_eq!(
            signals,
            vec![Signal::Hold, Signal::Hold, Signal::Buy, Signal::Sell, Signal::Hold]
        );
    }

    #[test]
    fn momentum_prediction_uses_reference_close() {
        let closes = [100.0, 104.0, 101.0, 102.0];
        let strategy = Momentum::new(MomentumParams {
            window: 2,
            threshold: 0.05,
        })
        .unwrap();
        let prediction = strategy.predict(&bars_from_closes(&closes));
        //next bar is compared with closes[2]
        assert!((prediction.next_buy_price.unwrap() - 101.0 * 1.05).abs() < 1e-9);
    }

    #[test]
    fn rejects_negative_threshold() {
        assert!(Momentum::new(MomentumParams {
            window: 3,
            threshold: -0.1
        })
        .is_err());
    }
}
