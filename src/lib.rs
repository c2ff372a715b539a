//signal-driven backtesting engine for a single instrument

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod policy;
pub mod portfolio;
pub mod report;
pub mod signal;
pub mod sweep;

//prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        BacktestConfiguration, BarInterval, PolicyConfig, PolicyType, RunConfig, StrategyParams,
        StrategyType,
    };
    pub use crate::data::{load_csv, Bar};
    pub use crate::engine::{BacktestEngine, RejectedTrade, RunResult, Trade, TradeAction};
    pub use crate::error::{BacktestError, ConfigError, TradeRejection};
    pub use crate::metrics::{EquitySnapshot, SummaryMetrics};
    pub use crate::policy::{build_policy, PositionPolicy, Proposal};
    pub use crate::portfolio::{Account, Position};
    pub use crate::report::{write_equity_csv, write_trades_csv};
    pub use crate::signal::{build_generator, Prediction, Signal, SignalGenerator, SignalSummary};
    pub use crate::sweep::{pretty_print_sweep, run_sweep, SweepEntry};
}
