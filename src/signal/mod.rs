pub mod bands;
pub mod channel;
pub mod crossover;
pub mod indicators;
pub mod oscillator;
pub mod summary;

pub use bands::{BollingerBreakout, MeanReversion};
pub use channel::{Breakout, Turtle};
pub use crossover::{KamaCross, MaCross, MacdCross};
pub use oscillator::{KdjSignal, Momentum, RsiSignal};
pub use summary::SignalSummary;

use crate::config::StrategyParams;
use crate::data::Bar;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

//discrete trade intent aligned with one bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Signal {
    Sell,
    #[default]
    Hold,
    Buy,
}

impl Signal {
    pub fn value(self) -> i8 {
        match self {
            Signal::Sell => -1,
            Signal::Hold => 0,
            Signal::Buy => 1,
        }
    }

    pub fn is_action(self) -> bool {
        self != Signal::Hold
    }
}

impl From<Signal> for i8 {
    fn from(signal: Signal) -> Self {
        signal.value()
    }
}

impl TryFrom<i8> for Signal {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Signal::Sell),
            0 => Ok(Signal::Hold),
            1 => Ok(Signal::Buy),
            other => Err(format!("signal must be -1, 0 or 1, got {}", other)),
        }
    }
}

//advisory estimate of the next price that would trigger a signal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub next_buy_price: Option<f64>,
    pub next_sell_price: Option<f64>,
    pub message: Option<String>,
}

impl Prediction {
    pub fn buy_at(price: f64) -> Self {
        Self::usable(price)
            .map(|p| Prediction {
                next_buy_price: Some(p),
                ..Default::default()
            })
            .unwrap_or_else(|| Self::unavailable("predicted buy level is undefined"))
    }

    pub fn sell_at(price: f64) -> Self {
        Self::usable(price)
            .map(|p| Prediction {
                next_sell_price: Some(p),
                ..Default::default()
            })
            .unwrap_or_else(|| Self::unavailable("predicted sell level is undefined"))
    }

    pub fn both(buy: f64, sell: f64) -> Self {
        Prediction {
            next_buy_price: Self::usable(buy),
            next_sell_price: Self::usable(sell),
            message: None,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Prediction {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.next_buy_price.is_none() && self.next_sell_price.is_none()
    }

    fn usable(price: f64) -> Option<f64> {
        (price.is_finite() && price > 0.0).then_some(price)
    }
}

//maps a price series to a signal series of identical length
//implementations hold only their parameters, so repeated calls give identical output
pub trait SignalGenerator: Send + Sync {
    fn generate(&self, bars: &[Bar]) -> Vec<Signal>;

    //estimates the price that would trigger the next signal
    fn predict(&self, bars: &[Bar]) -> Prediction;

    fn name(&self) -> &str;

    //bars needed before the first signal can appear
    fn lookback(&self) -> usize;
}

pub(crate) fn not_enough_data(bars: &[Bar], needed: usize) -> Option<Prediction> {
    (bars.len() < needed).then(|| {
        Prediction::unavailable(format!(
            "need at least {} bars, have {}",
            needed,
            bars.len()
        ))
    })
}

//fast line strictly above slow now, and at or below (or undefined) on the previous bar
pub fn crossed_above(prev: Option<(f64, f64)>, cur: Option<(f64, f64)>) -> bool {
    match cur {
        Some((fast, slow)) if fast > slow => prev.map_or(true, |(pf, ps)| pf <= ps),
        _ => false,
    }
}

//fast line strictly below slow now, and at or above (or undefined) on the previous bar
pub fn crossed_below(prev: Option<(f64, f64)>, cur: Option<(f64, f64)>) -> bool {
    match cur {
        Some((fast, slow)) if fast < slow => prev.map_or(true, |(pf, ps)| pf >= ps),
        _ => false,
    }
}

//price through a band or channel level; unlike a line crossover the bar before
//must already be measured against the level, so a close that is outside on the
//first defined bar is not a breakout
pub fn broke_above(prev: Option<(f64, f64)>, cur: Option<(f64, f64)>) -> bool {
    prev.is_some() && crossed_above(prev, cur)
}

pub fn broke_below(prev: Option<(f64, f64)>, cur: Option<(f64, f64)>) -> bool {
    prev.is_some() && crossed_below(prev, cur)
}

//signal series for a fast/slow line pair
pub fn crossover_signals(fast: &[Option<f64>], slow: &[Option<f64>]) -> Vec<Signal> {
    let mut prev = None;
    fast.iter()
        .zip(slow)
        .map(|(f, s)| {
            let cur = f.zip(*s);
            let signal = if crossed_above(prev, cur) {
                Signal::Buy
            } else if crossed_below(prev, cur) {
                Signal::Sell
            } else {
                Signal::Hold
            };
            prev = cur;
            signal
        })
        .collect()
}

//signal series for an oscillator against a low (buy) and high (sell) threshold
pub fn threshold_signals(values: &[Option<f64>], buy_below: f64, sell_above: f64) -> Vec<Signal> {
    values
        .iter()
        .map(|v| match v {
            Some(x) if *x < buy_below => Signal::Buy,
            Some(x) if *x > sell_above => Signal::Sell,
            _ => Signal::Hold,
        })
        .collect()
}

pub(crate) fn require_window(name: &'static str, window: usize) -> Result<(), ConfigError> {
    if window == 0 {
        return Err(ConfigError::invalid(name, "window must be at least 1"));
    }
    Ok(())
}

//resolves strategy parameters into a generator, once, before any bar is processed
pub fn build_generator(params: &StrategyParams) -> Result<Box<dyn SignalGenerator>, ConfigError> {
    let generator: Box<dyn SignalGenerator> = match params {
        StrategyParams::MaCross(p) => Box::new(MaCross::new(p.clone())?),
        StrategyParams::RsiSignal(p) => Box::new(RsiSignal::new(p.clone())?),
        StrategyParams::BollingerBreakout(p) => Box::new(BollingerBreakout::new(p.clone())?),
        StrategyParams::MacdCross(p) => Box::new(MacdCross::new(p.clone())?),
        StrategyParams::Momentum(p) => Box::new(Momentum::new(p.clone())?),
        StrategyParams::MeanReversion(p) => Box::new(MeanReversion::new(p.clone())?),
        StrategyParams::Breakout(p) => Box::new(Breakout::new(p.clone())?),
        StrategyParams::Turtle(p) => Box::new(Turtle::new(p.clone())?),
        StrategyParams::KdjSignal(p) => Box::new(KdjSignal::new(p.clone())?),
        StrategyParams::KamaCross(p) => Box::new(KamaCross::new(p.clone())?),
    };
    Ok(generator)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::data::Bar;
    use chrono::{Duration, TimeZone, Utc};

    //hourly bars with high/low half a unit around each close
    pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Bar::new_unchecked(
                    start + Duration::hours(i as i64),
                    c,
                    c + 0.5,
                    c - 0.5,
                    c,
                    1000.0,
                )
            })
            .collect()
    }
}
