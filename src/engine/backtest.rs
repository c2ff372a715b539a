use crate::config::RunConfig;
use crate::data::Bar;
use crate::engine::execution::{RejectedTrade, Trade};
use crate::error::BacktestError;
use crate::metrics::EquitySnapshot;
use crate::policy::PositionPolicy;
use crate::portfolio::Account;
use crate::signal::Signal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

//result of a single backtest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub initial_capital: f64,

    //cash plus holdings marked at the last close, open positions are not force-closed
    pub final_capital: f64,

    //gain or loss of the open position at the last close, zero when flat
    pub unrealized_pnl: f64,

    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquitySnapshot>,
    pub signals: Vec<Signal>,
    pub rejections: Vec<RejectedTrade>,
}

impl RunResult {
    pub fn total_return(&self) -> f64 {
        (self.final_capital - self.initial_capital) / self.initial_capital
    }

    //quantity still held after the last bar
    pub fn open_quantity(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|p| p.position_quantity)
            .unwrap_or(0.0)
    }
}

//signal-driven backtest engine
//single instrument, long only, trades fill at the bar close
#[derive(Debug, Clone, Default)]
pub struct BacktestEngine {
    config: RunConfig,
}

impl BacktestEngine {
    pub fn new(config: RunConfig) -> Self {
        BacktestEngine { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    //runs the simulation over aligned bar and signal series
    //all preconditions are checked before any state is created
    pub fn run(
        &self,
        bars: &[Bar],
        signals: &[Signal],
        policy: &mut dyn PositionPolicy,
    ) -> Result<RunResult, BacktestError> {
        self.config.validate()?;
        if bars.is_empty() {
            return Err(BacktestError::EmptySeries);
        }
        if bars.len() != signals.len() {
            return Err(BacktestError::LengthMismatch {
                bars: bars.len(),
                signals: signals.len(),
            });
        }

        info!(
            "Starting backtest: {} bars, policy {}, capital {:.2}",
            bars.len(),
            policy.name(),
            self.config.initial_capital
        );

        let mut account = Account::new(&self.config);
        let mut equity_curve = Vec::with_capacity(bars.len());
        policy.reset();

        //only a change in the raw signal is acted on
        let mut prev_signal = Signal::Hold;

        for (bar, &signal) in bars.iter().zip(signals) {
            if signal != prev_signal {
                match signal {
                    Signal::Buy => self.on_buy(&mut account, policy, bar),
                    Signal::Sell => self.on_sell(&mut account, policy, bar),
                    Signal::Hold => {}
                }
            }
            prev_signal = signal;

            equity_curve.push(EquitySnapshot::new(
                bar.timestamp,
                account.equity(bar.close),
                bar.close,
                account.position.quantity,
                signal,
            ));
        }

        //mark any open position at the last close
        let last_close = bars[bars.len() - 1].close;
        let final_capital = account.equity(last_close);
        let unrealized_pnl = account.position.unrealized_pnl(last_close);

        info!(
            "Backtest finished: {} trades, {} rejections, final capital {:.2}",
            account.trade_log.len(),
            account.rejections.len(),
            final_capital
        );

        Ok(RunResult {
            initial_capital: self.config.initial_capital,
            final_capital,
            unrealized_pnl,
            trades: account.trade_log,
            equity_curve,
            signals: signals.to_vec(),
            rejections: account.rejections,
        })
    }

    //a buy is allowed flat or holding; the policy decides whether to add
    fn on_buy(&self, account: &mut Account, policy: &mut dyn PositionPolicy, bar: &Bar) {
        let proposal = policy.on_buy_signal(
            account.cash,
            account.position.quantity,
            bar.close,
            self.config.commission_rate,
        );
        if proposal.is_empty() {
            debug!("{} declined buy at {}", policy.name(), bar.timestamp);
            return;
        }

        match account.execute_buy(bar.timestamp, bar.close, proposal) {
            Ok(trade) => debug!(
                "BUY {:.8} @ {:.4} cost {:.4} cash {:.4}",
                trade.quantity, trade.price, trade.value, trade.resulting_cash
            ),
            Err(reason) => warn!("Buy rejected at {}: {}", bar.timestamp, reason),
        }
    }

    //a sell is only considered while holding
    fn on_sell(&self, account: &mut Account, policy: &mut dyn PositionPolicy, bar: &Bar) {
        if !account.is_holding() {
            debug!("Sell signal at {} ignored while flat", bar.timestamp);
            return;
        }

        let proposal = policy.on_sell_signal(
            account.cash,
            account.position.quantity,
            bar.close,
            self.config.commission_rate,
        );
        if proposal.is_empty() {
            debug!("{} declined sell at {}", policy.name(), bar.timestamp);
            return;
        }

        match account.execute_sell(bar.timestamp, bar.close, proposal) {
            Ok(trade) => debug!(
                "SELL {:.8} @ {:.4} revenue {:.4} profit {:.4}",
                trade.quantity,
                trade.price,
                trade.value,
                trade.realized_profit.unwrap_or(0.0)
            ),
            Err(reason) => {
                warn!("Sell rejected at {}: {}", bar.timestamp, reason);
                return;
            }
        }

        //a closed cycle starts the staging over
        if !account.is_holding() {
            policy.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{AllIn, FixedRatio, Staged};
    use crate::signal::test_support::bars_from_closes;

    fn engine(commission_rate: f64) -> BacktestEngine {
        BacktestEngine::new(RunConfig {
            initial_capital: 10000.0,
            commission_rate,
            min_trade_unit: 1e-6,
        })
    }

    #[test]
    fn rejects_malformed_input() {
        let engine = engine(0.0);
        let bars = bars_from_closes(&[1.0, 2.0]);
        assert_eq!(
            engine.run(&[], &[], &mut AllIn).unwrap_err(),
            BacktestError::EmptySeries
        );
        assert_eq!(
            engine.run(&bars, &[Signal::Buy], &mut AllIn).unwrap_err(),
            BacktestError::LengthMismatch { bars: 2, signals: 1 }
        );

        let bad = BacktestEngine::new(RunConfig {
            initial_capital: -5.0,
            ..RunConfig::default()
        });
        assert!(matches!(
            bad.run(&bars, &[Signal::Hold, Signal::Hold], &mut AllIn),
            Err(BacktestError::NonPositiveCapital(_))
        ));
    }

    #[test]
    fn repeated_signals_trade_once() {
        let bars = bars_from_closes(&[10.0, 11.0, 12.0, 13.0]);
        let signals = [Signal::Buy; 4];
        let mut policy = FixedRatio::new(0.2).unwrap();
        let result = engine(0.0).run(&bars, &signals, &mut policy).unwrap();
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.equity_curve.len(), 4);
    }

    #[test]
    fn sell_while_flat_is_ignored() {
        let bars = bars_from_closes(&[10.0, 11.0]);
        let signals = [Signal::Sell, Signal::Hold];
        let result = engine(0.0).run(&bars, &signals, &mut AllIn).unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(result.final_capital, 10000.0);
        assert_eq!(result.unrealized_pnl, 0.0);
    }

    #[test]
    fn open_position_is_marked_to_market() {
        let bars = bars_from_closes(&[10.0, 20.0]);
        let signals = [Signal::Buy, Signal::Hold];
        let result = engine(0.0).run(&bars, &signals, &mut AllIn).unwrap();
        assert_eq!(result.final_capital, 20000.0);
        assert_eq!(result.open_quantity(), 1000.0);
        assert_eq!(result.unrealized_pnl, 10000.0);
        assert_eq!(result.equity_curve[0].equity, 10000.0);
    }

    #[test]
    fn staged_policy_restarts_after_flat() {
        let bars = bars_from_closes(&[10.0; 8]);
        let signals = [
            Signal::Buy,
            Signal::Hold,
            Signal::Buy,
            Signal::Sell,
            Signal::Buy,
            Signal::Hold,
            Signal::Hold,
            Signal::Hold,
        ];
        let mut policy = Staged::new(vec![0.2, 0.3, 0.5]).unwrap();
        let result = engine(0.0).run(&bars, &signals, &mut policy).unwrap();

        assert_eq!(result.trades.len(), 4);
        //first stage again after the full exit
        let rebuy = &result.trades[3];
        assert!((rebuy.value - 2000.0).abs() < 1e-9);
        assert!(result.rejections.is_empty());
    }

    #[test]
    fn signals_are_recorded_per_bar() {
        let bars = bars_from_closes(&[10.0, 10.0, 10.0]);
        let signals = [Signal::Hold, Signal::Buy, Signal::Sell];
        let result = engine(0.001).run(&bars, &signals, &mut AllIn).unwrap();
        let recorded: Vec<Signal> = result.equity_curve.iter().map(|p| p.signal).collect();
        assert_eq!(recorded, signals.to_vec());
        assert_eq!(result.signals, signals.to_vec());
        assert!(result.final_capital < 10000.0);
    }
}
