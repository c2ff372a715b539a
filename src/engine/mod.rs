pub mod backtest;
pub mod execution;

pub use backtest::{BacktestEngine, RunResult};
pub use execution::{RejectedTrade, Trade, TradeAction};
