use crate::error::ConfigError;
use crate::policy::{check_stages, PositionPolicy, Proposal};

//accumulates in stages (20/30/50% of the cash left at each step by default)
//any sell liquidates the full position and starts the stages over
#[derive(Debug, Clone)]
pub struct Staged {
    ratios: Vec<f64>,
    stage: usize,
}

impl Staged {
    pub fn new(ratios: Vec<f64>) -> Result<Self, ConfigError> {
        check_stages("ratios", &ratios)?;
        Ok(Staged { ratios, stage: 0 })
    }

    pub fn stage(&self) -> usize {
        self.stage
    }
}

impl PositionPolicy for Staged {
    fn on_buy_signal(
        &mut self,
        cash: f64,
        _position: f64,
        price: f64,
        commission_rate: f64,
    ) -> Proposal {
        let Some(&ratio) = self.ratios.get(self.stage) else {
            return Proposal::none();
        };
        self.stage += 1;
        Proposal::buy_with(cash * ratio, price, commission_rate)
    }

    fn on_sell_signal(
        &mut self,
        _cash: f64,
        position: f64,
        price: f64,
        commission_rate: f64,
    ) -> Proposal {
        self.reset();
        Proposal::sell(position, price, commission_rate)
    }

    fn reset(&mut self) {
        self.stage = 0;
    }

    fn name(&self) -> &str {
        "staged"
    }
}

//pyramid in (decreasing buy fractions), inverted pyramid out (increasing sell fractions)
//a buy restarts the sell ladder and a sell restarts the buy ladder
#[derive(Debug, Clone)]
pub struct Pyramid {
    add_ratios: Vec<f64>,
    reduce_ratios: Vec<f64>,
    add_count: usize,
    reduce_count: usize,
}

impl Pyramid {
    pub fn new(add_ratios: Vec<f64>, reduce_ratios: Vec<f64>) -> Result<Self, ConfigError> {
        check_stages("add_ratios", &add_ratios)?;
        check_stages("reduce_ratios", &reduce_ratios)?;
        Ok(Pyramid {
            add_ratios,
            reduce_ratios,
            add_count: 0,
            reduce_count: 0,
        })
    }

    pub fn counters(&self) -> (usize, usize) {
        (self.add_count, self.reduce_count)
    }
}

impl PositionPolicy for Pyramid {
    fn on_buy_signal(
        &mut self,
        cash: f64,
        _position: f64,
        price: f64,
        commission_rate: f64,
    ) -> Proposal {
        let Some(&ratio) = self.add_ratios.get(self.add_count) else {
            return Proposal::none();
        };
        self.add_count += 1;
        self.reduce_count = 0;
        Proposal::buy_with(cash * ratio, price, commission_rate)
    }

    fn on_sell_signal(
        &mut self,
        _cash: f64,
        position: f64,
        price: f64,
        commission_rate: f64,
    ) -> Proposal {
        let Some(&ratio) = self.reduce_ratios.get(self.reduce_count) else {
            return Proposal::none();
        };
        self.reduce_count += 1;
        self.add_count = 0;
        Proposal::sell(position * ratio, price, commission_rate)
    }

    fn reset(&mut self) {
        self.add_count = 0;
        self.reduce_count = 0;
    }

    fn name(&self) -> &str {
        "pyramid"
    }
}
