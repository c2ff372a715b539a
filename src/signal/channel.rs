use crate::config::{BreakoutParams, TurtleParams};
use crate::data::Bar;
use crate::error::ConfigError;
use crate::signal::indicators::{rolling_max, rolling_min, trailing};
use crate::signal::{
    broke_above, broke_below, not_enough_data, require_window, Prediction, Signal,
    SignalGenerator,
};

//donchian channel over the `window` bars preceding each index
fn prior_high(bars: &[Bar], window: usize) -> Vec<Option<f64>> {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    trailing(&rolling_max(&highs, window))
}

fn prior_low(bars: &[Bar], window: usize) -> Vec<Option<f64>> {
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    trailing(&rolling_min(&lows, window))
}

//buys when close breaks the entry channel high, sells when it breaks the exit channel low
fn channel_signals(bars: &[Bar], entry_window: usize, exit_window: usize) -> Vec<Signal> {
    let entry_high = prior_high(bars, entry_window);
    let exit_low = prior_low(bars, exit_window);

    let mut prev_high = None;
    let mut prev_low = None;
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let cur_high = entry_high[i].map(|h| (bar.close, h));
            let cur_low = exit_low[i].map(|l| (bar.close, l));
            let signal = if broke_above(prev_high, cur_high) {
                Signal::Buy
            } else if broke_below(prev_low, cur_low) {
                Signal::Sell
            } else {
                Signal::Hold
            };
            prev_high = cur_high;
            prev_low = cur_low;
            signal
        })
        .collect()
}

//the channel the next bar will be measured against
fn channel_prediction(bars: &[Bar], entry_window: usize, exit_window: usize) -> Prediction {
    let n = bars.len();
    let high = bars[n - entry_window..]
        .iter()
        .map(|b| b.high)
        .fold(f64::MIN, f64::max);
    let low = bars[n - exit_window..]
        .iter()
        .map(|b| b.low)
        .fold(f64::MAX, f64::min);

    if bars[n - 1].close < high {
        Prediction::buy_at(high)
    } else {
        Prediction::sell_at(low)
    }
}

//single-window channel breakout
#[derive(Debug, Clone)]
pub struct Breakout {
    params: BreakoutParams,
}

impl Breakout {
    pub fn new(params: BreakoutParams) -> Result<Self, ConfigError> {
        require_window("window", params.window)?;
        Ok(Breakout { params })
    }
}

impl SignalGenerator for Breakout {
    fn generate(&self, bars: &[Bar]) -> Vec<Signal> {
        channel_signals(bars, self.params.window, self.params.window)
    }

    fn predict(&self, bars: &[Bar]) -> Prediction {
        if let Some(p) = not_enough_data(bars, self.params.window) {
            return p;
        }
        channel_prediction(bars, self.params.window, self.params.window)
    }

    fn name(&self) -> &str {
        "breakout"
    }

    fn lookback(&self) -> usize {
        self.params.window + 1
    }
}

//turtle-style entry/exit with independent channel lengths
#[derive(Debug, Clone)]
pub struct Turtle {
    params: TurtleParams,
}

impl Turtle {
    pub fn new(params: TurtleParams) -> Result<Self, ConfigError> {
        require_window("entry_window", params.entry_window)?;
        require_window("exit_window", params.exit_window)?;
        Ok(Turtle { params })
    }
}

impl SignalGenerator for Turtle {
    fn generate(&self, bars: &[Bar]) -> Vec<Signal> {
        channel_signals(bars, self.params.entry_window, self.params.exit_window)
    }

    fn predict(&self, bars: &[Bar]) -> Prediction {
        let needed = self.params.entry_window.max(self.params.exit_window);
        if let Some(p) = not_enough_data(bars, needed) {
            return p;
        }
        channel_prediction(bars, self.params.entry_window, self.params.exit_window)
    }

    fn name(&self) -> &str {
        "turtle"
    }

    fn lookback(&self) -> usize {
        self.params.entry_window.min(self.params.exit_window) + 1
    }
}
