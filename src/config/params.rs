use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

//enumerated strategy registry, resolved once at setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    MaCross,
    RsiSignal,
    BollingerBreakout,
    MacdCross,
    Momentum,
    MeanReversion,
    Breakout,
    Turtle,
    KdjSignal,
    KamaCross,
}

impl StrategyType {
    pub const ALL: [StrategyType; 10] = [
        StrategyType::MaCross,
        StrategyType::RsiSignal,
        StrategyType::BollingerBreakout,
        StrategyType::MacdCross,
        StrategyType::Momentum,
        StrategyType::MeanReversion,
        StrategyType::Breakout,
        StrategyType::Turtle,
        StrategyType::KdjSignal,
        StrategyType::KamaCross,
    ];

    //parse strategy type from string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "ma_cross" | "ma" | "sma" => Ok(StrategyType::MaCross),
            "rsi_signal" | "rsi" => Ok(StrategyType::RsiSignal),
            "bollinger_breakout" | "bollinger" | "boll" => Ok(StrategyType::BollingerBreakout),
            "macd_cross" | "macd" => Ok(StrategyType::MacdCross),
            "momentum" | "mom" => Ok(StrategyType::Momentum),
            "mean_reversion" | "zscore" => Ok(StrategyType::MeanReversion),
            "breakout" => Ok(StrategyType::Breakout),
            "turtle" | "donchian" => Ok(StrategyType::Turtle),
            "kdj_signal" | "kdj" | "stochastic" => Ok(StrategyType::KdjSignal),
            "kama_cross" | "kama" => Ok(StrategyType::KamaCross),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrategyType::MaCross => "ma_cross",
            StrategyType::RsiSignal => "rsi_signal",
            StrategyType::BollingerBreakout => "bollinger_breakout",
            StrategyType::MacdCross => "macd_cross",
            StrategyType::Momentum => "momentum",
            StrategyType::MeanReversion => "mean_reversion",
            StrategyType::Breakout => "breakout",
            StrategyType::Turtle => "turtle",
            StrategyType::KdjSignal => "kdj_signal",
            StrategyType::KamaCross => "kama_cross",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaCrossParams {
    pub short_window: usize,
    pub long_window: usize,
}

impl Default for MaCrossParams {
    fn default() -> Self {
        MaCrossParams {
            short_window: 5,
            long_window: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiParams {
    pub period: usize,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for RsiParams {
    fn default() -> Self {
        RsiParams {
            period: 14,
            overbought: 70.0,
            oversold: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BollingerParams {
    pub window: usize,
    pub num_std: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        BollingerParams {
            window: 20,
            num_std: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        MacdParams {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumParams {
    pub window: usize,
    pub threshold: f64,
}

impl Default for MomentumParams {
    fn default() -> Self {
        MomentumParams {
            window: 10,
            threshold: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanReversionParams {
    pub window: usize,
    pub threshold: f64,
}

impl Default for MeanReversionParams {
    fn default() -> Self {
        MeanReversionParams {
            window: 20,
            threshold: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakoutParams {
    pub window: usize,
}

impl Default for BreakoutParams {
    fn default() -> Self {
        BreakoutParams { window: 20 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurtleParams {
    pub entry_window: usize,
    pub exit_window: usize,
}

impl Default for TurtleParams {
    fn default() -> Self {
        TurtleParams {
            entry_window: 18,
            exit_window: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KdjParams {
    pub n: usize,
    pub k_period: usize,
    pub d_period: usize,
}

impl Default for KdjParams {
    fn default() -> Self {
        KdjParams {
            n: 9,
            k_period: 3,
            d_period: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KamaParams {
    pub fast: usize,
    pub slow: usize,
    pub window: usize,
}

impl Default for KamaParams {
    fn default() -> Self {
        KamaParams {
            fast: 2,
            slow: 30,
            window: 10,
        }
    }
}

//"name(key=value,...)" from the serialized parameter fields, tag excluded
fn parameter_label<T: Serialize>(name: &str, tag: &str, params: &T) -> String {
    let fields = match serde_json::to_value(params) {
        Ok(serde_json::Value::Object(map)) => map
            .into_iter()
            .filter(|(key, _)| key != tag)
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>(),
        _ => Vec::new(),
    };
    if fields.is_empty() {
        name.to_string()
    } else {
        format!("{}({})", name, fields.join(","))
    }
}

//strategy-specific parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategyParams {
    MaCross(MaCrossParams),
    RsiSignal(RsiParams),
    BollingerBreakout(BollingerParams),
    MacdCross(MacdParams),
    Momentum(MomentumParams),
    MeanReversion(MeanReversionParams),
    Breakout(BreakoutParams),
    Turtle(TurtleParams),
    KdjSignal(KdjParams),
    KamaCross(KamaParams),
}

impl StrategyParams {
    //default parameter set of a strategy type
    pub fn default_for(strategy: StrategyType) -> Self {
        match strategy {
            StrategyType::MaCross => StrategyParams::MaCross(MaCrossParams::default()),
            StrategyType::RsiSignal => StrategyParams::RsiSignal(RsiParams::default()),
            StrategyType::BollingerBreakout => {
                StrategyParams::BollingerBreakout(BollingerParams::default())
            }
            StrategyType::MacdCross => StrategyParams::MacdCross(MacdParams::default()),
            StrategyType::Momentum => StrategyParams::Momentum(MomentumParams::default()),
            StrategyType::MeanReversion => {
                StrategyParams::MeanReversion(MeanReversionParams::default())
            }
            StrategyType::Breakout => StrategyParams::Breakout(BreakoutParams::default()),
            StrategyType::Turtle => StrategyParams::Turtle(TurtleParams::default()),
            StrategyType::KdjSignal => StrategyParams::KdjSignal(KdjParams::default()),
            StrategyType::KamaCross => StrategyParams::KamaCross(KamaParams::default()),
        }
    }

    //strategy name together with its parameter values
    pub fn label(&self) -> String {
        parameter_label(self.strategy_type().name(), "strategy", self)
    }

    pub fn strategy_type(&self) -> StrategyType {
        match self {
            StrategyParams::MaCross(_) => StrategyType::MaCross,
            StrategyParams::RsiSignal(_) => StrategyType::RsiSignal,
            StrategyParams::BollingerBreakout(_) => StrategyType::BollingerBreakout,
            StrategyParams::MacdCross(_) => StrategyType::MacdCross,
            StrategyParams::Momentum(_) => StrategyType::Momentum,
            StrategyParams::MeanReversion(_) => StrategyType::MeanReversion,
            StrategyParams::Breakout(_) => StrategyType::Breakout,
            StrategyParams::Turtle(_) => StrategyType::Turtle,
            StrategyParams::KdjSignal(_) => StrategyType::KdjSignal,
            StrategyParams::KamaCross(_) => StrategyType::KamaCross,
        }
    }
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams::MaCross(MaCrossParams::default())
    }
}

//position-sizing policy identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    AllIn,
    FixedRatio,
    Staged,
    Pyramid,
}

impl PolicyType {
    pub const ALL: [PolicyType; 4] = [
        PolicyType::AllIn,
        PolicyType::FixedRatio,
        PolicyType::Staged,
        PolicyType::Pyramid,
    ];

    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "all_in" | "allin" | "full" => Ok(PolicyType::AllIn),
            "fixed_ratio" | "fixed" => Ok(PolicyType::FixedRatio),
            "staged" | "two_three_five" | "235" => Ok(PolicyType::Staged),
            "pyramid" => Ok(PolicyType::Pyramid),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PolicyType::AllIn => "all_in",
            PolicyType::FixedRatio => "fixed_ratio",
            PolicyType::Staged => "staged",
            PolicyType::Pyramid => "pyramid",
        }
    }
}

//policy-specific parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum PolicyConfig {
    AllIn,
    FixedRatio {
        ratio: f64,
    },
    Staged {
        ratios: Vec<f64>,
    },
    Pyramid {
        add_ratios: Vec<f64>,
        reduce_ratios: Vec<f64>,
    },
}

impl PolicyConfig {
    pub fn default_for(policy: PolicyType) -> Self {
        match policy {
            PolicyType::AllIn => PolicyConfig::AllIn,
            PolicyType::FixedRatio => PolicyConfig::FixedRatio { ratio: 0.2 },
            PolicyType::Staged => PolicyConfig::Staged {
                ratios: vec![0.2, 0.3, 0.5],
            },
            PolicyType::Pyramid => PolicyConfig::Pyramid {
                add_ratios: vec![0.3, 0.25, 0.2, 0.15, 0.1],
                reduce_ratios: vec![0.1, 0.15, 0.2, 0.25, 0.3],
            },
        }
    }

    pub fn label(&self) -> String {
        parameter_label(self.policy_type().name(), "policy", self)
    }

    pub fn policy_type(&self) -> PolicyType {
        match self {
            PolicyConfig::AllIn => PolicyType::AllIn,
            PolicyConfig::FixedRatio { .. } => PolicyType::FixedRatio,
            PolicyConfig::Staged { .. } => PolicyType::Staged,
            PolicyConfig::Pyramid { .. } => PolicyType::Pyramid,
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig::default_for(PolicyType::FixedRatio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strategy_aliases() {
        assert_eq!(StrategyType::parse("SMA").unwrap(), StrategyType::MaCross);
        assert_eq!(StrategyType::parse("donchian").unwrap(), StrategyType::Turtle);
        assert!(matches!(
            StrategyType::parse("astrology"),
            Err(ConfigError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn every_strategy_name_round_trips_through_parse() {
        for strategy in StrategyType::ALL {
            assert_eq!(StrategyType::parse(strategy.name()).unwrap(), strategy);
            assert_eq!(StrategyParams::default_for(strategy).strategy_type(), strategy);
        }
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!(PolicyType::parse("all-in").unwrap(), PolicyType::AllIn);
        assert_eq!(PolicyType::parse("235").unwrap(), PolicyType::Staged);
        assert!(PolicyType::parse("martingale").is_err());
    }

    #[test]
    fn labels_carry_parameter_values() {
        let short = StrategyParams::MaCross(MaCrossParams {
            short_window: 3,
            long_window: 8,
        });
        let label = short.label();
        assert!(label.starts_with("ma_cross("));
        assert!(label.contains("short_window=3"));
        assert!(label.contains("long_window=8"));
        assert_ne!(label, StrategyParams::default().label());

        assert_eq!(PolicyConfig::AllIn.label(), "all_in");
        assert_eq!(
            PolicyConfig::FixedRatio { ratio: 0.5 }.label(),
            "fixed_ratio(ratio=0.5)"
        );
    }

    #[test]
    fn strategy_params_are_tagged_in_json() {
        let params = StrategyParams::RsiSignal(RsiParams::default());
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["strategy"], "rsi_signal");
        assert_eq!(json["period"], 14);

        let back: StrategyParams = serde_json::from_value(json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn policy_defaults_match_stage_tables() {
        match PolicyConfig::default_for(PolicyType::Pyramid) {
            PolicyConfig::Pyramid {
                add_ratios,
                reduce_ratios,
            } => {
                assert_eq!(add_ratios.len(), 5);
                assert_eq!(reduce_ratios.len(), 5);
                assert!(add_ratios.windows(2).all(|w| w[0] > w[1]));
                assert!(reduce_ratios.windows(2).all(|w| w[0] < w[1]));
            }
            other => panic!("unexpected config {:?}", other),
        }
    }
}
