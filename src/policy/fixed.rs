use crate::error::ConfigError;
use crate::policy::{check_stages, PositionPolicy, Proposal};

//spends all available cash on a buy, liquidates the whole position on a sell
#[derive(Debug, Clone, Copy, Default)]
pub struct AllIn;

impl PositionPolicy for AllIn {
    fn on_buy_signal(
        &mut self,
        cash: f64,
        _position: f64,
        price: f64,
        commission_rate: f64,
    ) -> Proposal {
        Proposal::buy_with(cash, price, commission_rate)
    }

    fn on_sell_signal(
        &mut self,
        _cash: f64,
        position: f64,
        price: f64,
        commission_rate: f64,
    ) -> Proposal {
        Proposal::sell(position, price, commission_rate)
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "all_in"
    }
}

//trades a fixed fraction of current cash (buy) or current holdings (sell)
#[derive(Debug, Clone, Copy)]
pub struct FixedRatio {
    ratio: f64,
}

impl FixedRatio {
    pub fn new(ratio: f64) -> Result<Self, ConfigError> {
        check_stages("ratio", &[ratio])?;
        Ok(FixedRatio { ratio })
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }
}

impl PositionPolicy for FixedRatio {
    fn on_buy_signal(
        &mut self,
        cash: f64,
        _position: f64,
        price: f64,
        commission_rate: f64,
    ) -> Proposal {
        Proposal::buy_with(cash * self.ratio, price, commission_rate)
    }

    fn on_sell_signal(
        &mut self,
        _cash: f64,
        position: f64,
        price: f64,
        commission_rate: f64,
    ) -> Proposal {
        Proposal::sell(position * self.ratio, price, commission_rate)
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "fixed_ratio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_in_spends_everything() {
        let mut policy = AllIn;
        let buy = policy.on_buy_signal(10000.0, 0.0, 100.0, 0.0);
        assert_eq!(buy.quantity, 100.0);
        assert_eq!(buy.value, 10000.0);

        let sell = policy.on_sell_signal(0.0, 100.0, 120.0, 0.0);
        assert_eq!(sell.quantity, 100.0);
        assert_eq!(sell.value, 12000.0);
    }

    #[test]
    fn fixed_ratio_first_buy() {
        let mut policy = FixedRatio::new(0.2).unwrap();
        let buy = policy.on_buy_signal(10000.0, 0.0, 100.0, 0.001);
        assert!((buy.quantity - 19.98).abs() < 1e-2);
        assert!((buy.value - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn fixed_ratio_sells_a_fraction_of_holdings() {
        let mut policy = FixedRatio::new(0.25).unwrap();
        let sell = policy.on_sell_signal(0.0, 40.0, 10.0, 0.0);
        assert_eq!(sell.quantity, 10.0);
        assert_eq!(sell.value, 100.0);
    }

    #[test]
    fn zero_cash_proposes_nothing() {
        let mut policy = FixedRatio::new(0.5).unwrap();
        assert!(policy.on_buy_signal(0.0, 3.0, 10.0, 0.0).is_empty());
    }
}
