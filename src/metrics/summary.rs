use crate::engine::{RunResult, Trade};
use crate::metrics::timeseries::{calculate_returns, equity_values, max_drawdown, EquitySnapshot};
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

//summary metrics for a backtest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub initial_capital: f64,
    pub final_capital: f64,
    pub unrealized_pnl: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub total_trades: usize,
    pub buy_trades: usize,
    pub sell_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub total_commission: f64,
    pub commission_rate: f64,
    pub exposure: f64,
    pub rejected_trades: usize,
}

impl SummaryMetrics {
    //derives every metric from the run result alone
    //annualization_factor is the number of bars per year for the bar interval
    pub fn from_run(result: &RunResult, annualization_factor: f64) -> Self {
        let initial_capital = result.initial_capital;
        let final_capital = result.final_capital;
        let total_return = (final_capital - initial_capital) / initial_capital;

        let annualized_return = annualize(total_return, &result.equity_curve);

        let equity = equity_values(&result.equity_curve);
        let returns = calculate_returns(&equity);
        let sharpe_ratio = calculate_sharpe_ratio(&returns, annualization_factor);
        let sortino_ratio = calculate_sortino_ratio(&returns, annualization_factor);

        let stats = calculate_trade_statistics(&result.trades);

        let total_commission: f64 = result.trades.iter().map(|t| t.commission).sum();

        SummaryMetrics {
            initial_capital,
            final_capital,
            unrealized_pnl: result.unrealized_pnl,
            total_return,
            annualized_return,
            max_drawdown: max_drawdown(&equity),
            sharpe_ratio,
            sortino_ratio,
            win_rate: stats.win_rate,
            avg_win: stats.avg_win,
            avg_loss: stats.avg_loss,
            profit_factor: stats.profit_factor,
            largest_win: stats.largest_win,
            largest_loss: stats.largest_loss,
            total_trades: result.trades.len(),
            buy_trades: result.trades.len() - stats.sell_trades,
            sell_trades: stats.sell_trades,
            winning_trades: stats.winning_trades,
            losing_trades: stats.losing_trades,
            total_commission,
            commission_rate: total_commission / initial_capital,
            exposure: calculate_exposure(&result.equity_curve),
            rejected_trades: result.rejections.len(),
        }
    }

    //return after subtracting commission drag
    pub fn net_return(&self) -> f64 {
        self.total_return - self.commission_rate
    }

    //prints metrics in a formatted table
    pub fn pretty_print_table(&self) {
        let mut table = Table::new();

        table.add_row(Row::new(vec![Cell::new("Metric"), Cell::new("Value")]));

        let rows: Vec<(&str, String)> = vec![
            ("Initial Capital", format!("${:.2}", self.initial_capital)),
            ("Final Capital", format!("${:.2}", self.final_capital)),
            ("Open Position PnL", format!("${:.2}", self.unrealized_pnl)),
            ("Total Return", format!("{:.2}%", self.total_return * 100.0)),
            (
                "Annualized Return",
                format!("{:.2}%", self.annualized_return * 100.0),
            ),
            ("Max Drawdown", format!("{:.2}%", self.max_drawdown * 100.0)),
            ("Sharpe Ratio", format!("{:.3}", self.sharpe_ratio)),
            ("Sortino Ratio", format!("{:.3}", self.sortino_ratio)),
            (
                "Trades (buy/sell)",
                format!(
                    "{} ({}/{})",
                    self.total_trades, self.buy_trades, self.sell_trades
                ),
            ),
            ("Win Rate", format!("{:.2}%", self.win_rate * 100.0)),
            ("Avg Win", format!("${:.2}", self.avg_win)),
            ("Avg Loss", format!("${:.2}", self.avg_loss)),
            ("Largest Win", format!("${:.2}", self.largest_win)),
            ("Largest Loss", format!("${:.2}", self.largest_loss)),
            ("Profit Factor", format!("{:.3}", self.profit_factor)),
            ("Total Commission", format!("${:.2}", self.total_commission)),
            (
                "Commission Rate",
                format!("{:.4}%", self.commission_rate * 100.0),
            ),
            ("Net Return", format!("{:.2}%", self.net_return() * 100.0)),
            ("Exposure", format!("{:.2}%", self.exposure * 100.0)),
            ("Rejected Trades", format!("{}", self.rejected_trades)),
        ];

        for (label, value) in rows {
            table.add_row(Row::new(vec![Cell::new(label), Cell::new(&value)]));
        }

        table.printstd();
    }
}

//compounds the total return over a 365-day year using fractional elapsed days
fn annualize(total_return: f64, curve: &[EquitySnapshot]) -> f64 {
    let (Some(first), Some(last)) = (curve.first(), curve.last()) else {
        return total_return;
    };
    let elapsed_days = (last.timestamp - first.timestamp).num_seconds() as f64 / 86_400.0;
    if elapsed_days <= 0.0 {
        return total_return;
    }
    (1.0 + total_return).powf(365.0 / elapsed_days) - 1.0
}

struct TradeStats {
    sell_trades: usize,
    winning_trades: usize,
    losing_trades: usize,
    win_rate: f64,
    avg_win: f64,
    avg_loss: f64,
    profit_factor: f64,
    largest_win: f64,
    largest_loss: f64,
}

//classifies sells by realized profit: strictly positive wins, everything else loses
fn calculate_trade_statistics(trades: &[Trade]) -> TradeStats {
    let profits: Vec<f64> = trades.iter().filter_map(|t| t.realized_profit).collect();

    let wins: Vec<f64> = profits.iter().copied().filter(|p| *p > 0.0).collect();
    let losses: Vec<f64> = profits.iter().copied().filter(|p| *p <= 0.0).collect();

    let mean_or_zero = |values: &[f64]| {
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    };
    let avg_win = mean_or_zero(&wins);
    let avg_loss = mean_or_zero(&losses);

    let win_rate = if profits.is_empty() {
        0.0
    } else {
        wins.len() as f64 / profits.len() as f64
    };

    let profit_factor = if avg_loss == 0.0 {
        f64::INFINITY
    } else {
        (avg_win / avg_loss).abs()
    };

    TradeStats {
        sell_trades: profits.len(),
        winning_trades: wins.len(),
        losing_trades: losses.len(),
        win_rate,
        avg_win,
        avg_loss,
        profit_factor,
        largest_win: wins.iter().fold(0.0f64, |a, &b| a.max(b)),
        largest_loss: losses.iter().fold(0.0f64, |a, &b| a.min(b)),
    }
}

fn calculate_sharpe_ratio(returns: &[f64], annualization_factor: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let mean = returns.mean();
    let std_dev = returns.std_dev();

    if std_dev == 0.0 || !std_dev.is_finite() {
        return 0.0;
    }

    (mean / std_dev) * annualization_factor.sqrt()
}

//downside deviation is the root mean square of the negative returns
fn calculate_sortino_ratio(returns: &[f64], annualization_factor: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let mean = returns.mean();
    let downside: f64 = returns.iter().map(|r| r.min(0.0).powi(2)).sum::<f64>();
    let downside_dev = (downside / returns.len() as f64).sqrt();

    if downside_dev == 0.0 {
        return if mean > 0.0 { f64::INFINITY } else { 0.0 };
    }

    (mean / downside_dev) * annualization_factor.sqrt()
}

//fraction of bars that end with a position open
fn calculate_exposure(curve: &[EquitySnapshot]) -> f64 {
    if curve.is_empty() {
        return 0.0;
    }
    let in_market = curve.iter().filter(|p| p.position_quantity > 0.0).count();
    in_market as f64 / curve.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TradeAction;
    use crate::signal::Signal;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn curve(equity: &[f64], step: Duration) -> Vec<EquitySnapshot> {
        equity
            .iter()
            .enumerate()
            .map(|(i, &e)| EquitySnapshot::new(start() + step * i as i32, e, 1.0, 0.0, Signal::Hold))
            .collect()
    }

    fn sell(profit: f64) -> Trade {
        Trade::sell(start(), 10.0, 1.0, 10.0 + profit, 0.0, profit)
    }

    fn result(equity: &[f64], trades: Vec<Trade>) -> RunResult {
        RunResult {
            initial_capital: equity[0],
            final_capital: equity[equity.len() - 1],
            unrealized_pnl: 0.0,
            trades,
            equity_curve: curve(equity, Duration::days(1)),
            signals: vec![Signal::Hold; equity.len()],
            rejections: Vec::new(),
        }
    }

    #[test]
    fn flat_run_has_neutral_metrics() {
        let metrics = SummaryMetrics::from_run(&result(&[1000.0; 5], Vec::new()), 252.0);
        assert_eq!(metrics.total_return, 0.0);
        assert_eq!(metrics.annualized_return, 0.0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
        assert_eq!(metrics.max_drawdown, 0.0);
        assert_eq!(metrics.win_rate, 0.0);
        assert!(metrics.profit_factor.is_infinite());
        assert_eq!(metrics.total_commission, 0.0);
    }

    #[test]
    fn win_loss_classification() {
        let trades = vec![sell(30.0), sell(-10.0), sell(0.0), sell(10.0)];
        let stats = calculate_trade_statistics(&trades);
        assert_eq!(stats.sell_trades, 4);
        assert_eq!(stats.winning_trades, 2);
        assert_eq!(stats.losing_trades, 2);
        assert_eq!(stats.win_rate, 0.5);
        assert_eq!(stats.avg_win, 20.0);
        assert_eq!(stats.avg_loss, -5.0);
        assert_eq!(stats.profit_factor, 4.0);
        assert_eq!(stats.largest_win, 30.0);
        assert_eq!(stats.largest_loss, -10.0);
    }

    #[test]
    fn buys_do_not_count_toward_win_rate() {
        let buy = Trade::buy(start(), 10.0, 1.0, 10.0, 990.0);
        assert_eq!(buy.action, TradeAction::Buy);
        let stats = calculate_trade_statistics(&[buy, sell(5.0)]);
        assert_eq!(stats.sell_trades, 1);
        assert_eq!(stats.win_rate, 1.0);
        assert!(stats.profit_factor.is_infinite());
    }

    #[test]
    fn annualizes_over_elapsed_days() {
        let run = result(&[100.0, 105.0, 110.0], Vec::new());
        let metrics = SummaryMetrics::from_run(&run, 252.0);
        let expected = 1.1f64.powf(365.0 / 2.0) - 1.0;
        assert!((metrics.annualized_return - expected).abs() < 1e-9 * expected);
    }

    #[test]
    fn single_snapshot_annualized_equals_total() {
        let mut run = result(&[100.0, 120.0], Vec::new());
        run.equity_curve.truncate(1);
        let metrics = SummaryMetrics::from_run(&run, 252.0);
        assert_eq!(metrics.annualized_return, metrics.total_return);
    }

    #[test]
    fn sharpe_scales_with_annualization() {
        let run = result(&[100.0, 101.0, 100.5, 102.0, 101.0], Vec::new());
        let daily = SummaryMetrics::from_run(&run, 252.0).sharpe_ratio;
        let minutes = SummaryMetrics::from_run(&run, 252.0 * 24.0 * 60.0).sharpe_ratio;
        assert!(daily != 0.0);
        assert!((minutes / daily - (24.0f64 * 60.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn drawdown_and_commission() {
        let trades = vec![
            Trade::buy(start(), 100.0, 10.0, 1001.0, 8999.0),
            Trade::sell(start(), 100.0, 10.0, 999.0, 9998.0, -2.0),
        ];
        let run = result(&[10000.0, 12000.0, 9000.0, 9998.0], trades);
        let metrics = SummaryMetrics::from_run(&run, 252.0);
        assert!((metrics.max_drawdown + 0.25).abs() < 1e-12);
        assert!((metrics.total_commission - 2.0).abs() < 1e-9);
        assert!((metrics.commission_rate - 0.0002).abs() < 1e-12);
        assert_eq!(metrics.buy_trades, 1);
        assert_eq!(metrics.losing_trades, 1);
        assert!((metrics.net_return() - (metrics.total_return - 0.0002)).abs() < 1e-12);
    }

    #[test]
    fn exposure_counts_bars_in_market() {
        let mut run = result(&[100.0; 4], Vec::new());
        run.equity_curve[1].position_quantity = 2.0;
        run.equity_curve[2].position_quantity = 2.0;
        let metrics = SummaryMetrics::from_run(&run, 252.0);
        assert_eq!(metrics.exposure, 0.5);
    }
}
