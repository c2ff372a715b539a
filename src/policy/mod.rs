pub mod fixed;
pub mod staged;

pub use fixed::{AllIn, FixedRatio};
pub use staged::{Pyramid, Staged};

use crate::config::PolicyConfig;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

//a sizing decision: quantity to trade and the cash it costs (buy) or returns (sell)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub quantity: f64,
    pub value: f64,
}

impl Proposal {
    pub fn none() -> Self {
        Proposal::default()
    }

    //spends `budget` of cash, commission included
    pub fn buy_with(budget: f64, price: f64, commission_rate: f64) -> Self {
        let unit_cost = price * (1.0 + commission_rate);
        if budget <= 0.0 || unit_cost <= 0.0 {
            return Proposal::none();
        }
        let quantity = budget / unit_cost;
        Proposal {
            quantity,
            value: quantity * unit_cost,
        }
    }

    //sells `quantity` and returns the net revenue after commission
    pub fn sell(quantity: f64, price: f64, commission_rate: f64) -> Self {
        if quantity <= 0.0 {
            return Proposal::none();
        }
        Proposal {
            quantity,
            value: quantity * price * (1.0 - commission_rate),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.quantity <= 0.0
    }
}

//position-sizing policy interface
//a policy only proposes; the engine checks affordability and applies the trade
pub trait PositionPolicy: Send {
    //called on a buy transition with current cash and held quantity
    fn on_buy_signal(
        &mut self,
        cash: f64,
        position: f64,
        price: f64,
        commission_rate: f64,
    ) -> Proposal;

    //called on a sell transition while holding
    fn on_sell_signal(
        &mut self,
        cash: f64,
        position: f64,
        price: f64,
        commission_rate: f64,
    ) -> Proposal;

    //clears staging counters, idempotent
    fn reset(&mut self);

    fn name(&self) -> &str;
}

fn check_ratio(name: &'static str, ratio: f64) -> Result<(), ConfigError> {
    if ratio.is_nan() || ratio <= 0.0 || ratio > 1.0 {
        return Err(ConfigError::invalid(
            name,
            format!("ratio {} is outside (0, 1]", ratio),
        ));
    }
    Ok(())
}

pub(crate) fn check_stages(name: &'static str, ratios: &[f64]) -> Result<(), ConfigError> {
    if ratios.is_empty() {
        return Err(ConfigError::invalid(name, "at least one stage is required"));
    }
    ratios.iter().try_for_each(|r| check_ratio(name, *r))
}

//builds a fresh policy instance; every run must own its own
pub fn build_policy(config: &PolicyConfig) -> Result<Box<dyn PositionPolicy>, ConfigError> {
    let policy: Box<dyn PositionPolicy> = match config {
        PolicyConfig::AllIn => Box::new(AllIn),
        PolicyConfig::FixedRatio { ratio } => Box::new(FixedRatio::new(*ratio)?),
        PolicyConfig::Staged { ratios } => Box::new(Staged::new(ratios.clone())?),
        PolicyConfig::Pyramid {
            add_ratios,
            reduce_ratios,
        } => Box::new(Pyramid::new(add_ratios.clone(), reduce_ratios.clone())?),
    };
    Ok(policy)
}
