use crate::config::RunConfig;
use crate::engine::execution::{RejectedTrade, Trade, TradeAction};
use crate::error::TradeRejection;
use crate::policy::Proposal;
use crate::portfolio::position::Position;
use chrono::{DateTime, Utc};

//relative slack on cash/holdings comparisons, rounding residue only
const GATE_TOLERANCE: f64 = 1e-12;

//simulation state for one run: cash, the single holding, and the trade trail
#[derive(Debug, Clone)]
pub struct Account {
    //current cash, never negative
    pub cash: f64,

    pub position: Position,

    pub commission_rate: f64,
    pub min_trade_unit: f64,

    //complete trade log
    pub trade_log: Vec<Trade>,

    //proposals refused by the affordability gate
    pub rejections: Vec<RejectedTrade>,
}

impl Account {
    //creates a flat account holding only cash
    pub fn new(config: &RunConfig) -> Self {
        Account {
            cash: config.initial_capital,
            position: Position::new(),
            commission_rate: config.commission_rate,
            min_trade_unit: config.min_trade_unit,
            trade_log: Vec::new(),
            rejections: Vec::new(),
        }
    }

    //returns true while a position is open
    pub fn is_holding(&self) -> bool {
        !self.position.is_flat()
    }

    //cash plus mark-to-market holdings
    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.position.market_value(price)
    }

    //applies a buy proposal if it is affordable
    pub fn execute_buy(
        &mut self,
        timestamp: DateTime<Utc>,
        price: f64,
        proposal: Proposal,
    ) -> Result<&Trade, TradeRejection> {
        let Proposal {
            quantity,
            value: cost,
        } = proposal;

        let check = if quantity < self.min_trade_unit {
            Err(TradeRejection::BelowMinimumUnit {
                quantity,
                minimum: self.min_trade_unit,
            })
        } else if cost > self.cash + GATE_TOLERANCE * self.cash.max(1.0) {
            Err(TradeRejection::InsufficientCash {
                cost,
                cash: self.cash,
            })
        } else {
            Ok(())
        };
        if let Err(reason) = check {
            return Err(self.reject(timestamp, TradeAction::Buy, price, proposal, reason));
        }

        self.cash = (self.cash - cost).max(0.0);
        self.position.add(quantity, price);
        self.trade_log
            .push(Trade::buy(timestamp, price, quantity, cost, self.cash));
        Ok(&self.trade_log[self.trade_log.len() - 1])
    }

    //applies a sell proposal if the holdings cover it
    pub fn execute_sell(
        &mut self,
        timestamp: DateTime<Utc>,
        price: f64,
        proposal: Proposal,
    ) -> Result<&Trade, TradeRejection> {
        let Proposal {
            quantity,
            value: revenue,
        } = proposal;
        let held = self.position.quantity;

        let check = if quantity < self.min_trade_unit {
            Err(TradeRejection::BelowMinimumUnit {
                quantity,
                minimum: self.min_trade_unit,
            })
        } else if quantity > held + GATE_TOLERANCE * held.max(1.0) {
            Err(TradeRejection::InsufficientHoldings { quantity, held })
        } else {
            Ok(())
        };
        if let Err(reason) = check {
            return Err(self.reject(timestamp, TradeAction::Sell, price, proposal, reason));
        }

        let realized = self.position.reduce(quantity, revenue);
        self.cash += revenue;
        self.trade_log.push(Trade::sell(
            timestamp,
            price,
            quantity.min(held),
            revenue,
            self.cash,
            realized,
        ));
        Ok(&self.trade_log[self.trade_log.len() - 1])
    }

    fn reject(
        &mut self,
        timestamp: DateTime<Utc>,
        action: TradeAction,
        price: f64,
        proposal: Proposal,
        reason: TradeRejection,
    ) -> TradeRejection {
        self.rejections.push(RejectedTrade {
            timestamp,
            action,
            price,
            quantity: proposal.quantity,
            value: proposal.value,
            reason: reason.clone(),
        });
        reason
    }
}
