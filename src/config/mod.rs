pub mod backtest_config;
pub mod params;

pub use backtest_config::{BacktestConfiguration, BarInterval, RunConfig};
pub use params::{
    BollingerParams, BreakoutParams, KamaParams, KdjParams, MaCrossParams, MacdParams,
    MeanReversionParams, MomentumParams, PolicyConfig, PolicyType, RsiParams, StrategyParams,
    StrategyType, TurtleParams,
};
