//rolling indicator series, aligned one-to-one with their input
//a `None` entry means the indicator is not yet defined at that index

use statrs::statistics::Statistics;

fn rolling<F>(values: &[f64], window: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = vec![None; values.len()];
    if window == 0 || window > values.len() {
        return out;
    }
    for (i, slot) in out.iter_mut().enumerate().skip(window - 1) {
        *slot = Some(f(&values[i + 1 - window..=i]));
    }
    out
}

//helper function to calculate simple moving average
pub fn sma(prices: &[f64]) -> Option<f64> {
    if prices.is_empty() {
        return None;
    }
    Some(prices.iter().sum::<f64>() / prices.len() as f64)
}

pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

//sample standard deviation (n - 1), undefined for windows below 2
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window < 2 {
        return vec![None; values.len()];
    }
    rolling(values, window, |w| w.std_dev())
}

pub fn rolling_max(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().copied().fold(f64::MIN, f64::max))
}

pub fn rolling_min(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().copied().fold(f64::MAX, f64::min))
}

//the same rolling window, but ending one bar before each index
pub fn trailing(series: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(series.len());
    if !series.is_empty() {
        out.push(None);
        out.extend_from_slice(&series[..series.len() - 1]);
    }
    out
}

//exponential moving average with alpha = 2 / (span + 1), seeded with the first value
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &v in values {
        let next = match prev {
            Some(p) => p + alpha * (v - p),
            None => v,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

//exponential smoothing of a partially defined series, starting at its first defined value
pub fn ewm(values: &[Option<f64>], alpha: f64) -> Vec<Option<f64>> {
    let mut prev: Option<f64> = None;
    values
        .iter()
        .map(|v| {
            prev = match (prev, *v) {
                (Some(p), Some(x)) => Some(p + alpha * (x - p)),
                (None, Some(x)) => Some(x),
                (p, None) => p,
            };
            prev
        })
        .collect()
}

//relative change over `periods` bars
pub fn pct_change(values: &[f64], periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if periods == 0 || i < periods || values[i - periods] == 0.0 {
                None
            } else {
                Some(values[i] / values[i - periods] - 1.0)
            }
        })
        .collect()
}

//rsi from simple rolling means of gains and losses
//undefined until `period` price changes exist, and when the window has no movement
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let gains: Vec<f64> = changes.iter().map(|c| c.max(0.0)).collect();
    let losses: Vec<f64> = changes.iter().map(|c| (-c).max(0.0)).collect();

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    for (i, slot) in out.iter_mut().enumerate().skip(1) {
        *slot = match (avg_gain[i - 1], avg_loss[i - 1]) {
            (Some(g), Some(l)) => rsi_from_averages(g, l),
            _ => None,
        };
    }
    out
}

pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { None } else { Some(100.0) };
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}

//last defined value of a series
pub fn last(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}
