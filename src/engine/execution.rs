use crate::error::TradeRejection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

//trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    //sign of the cash flow (buy spends, sell receives)
    pub fn cash_sign(&self) -> f64 {
        match self {
            TradeAction::Buy => -1.0,
            TradeAction::Sell => 1.0,
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
        }
    }
}

//an executed trade, immutable once appended to the trade log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub timestamp: DateTime<Utc>,
    pub action: TradeAction,
    pub price: f64,
    pub quantity: f64,

    //cash spent on a buy or received on a sell, commission included
    pub value: f64,

    //difference between notional and the actual cash movement
    pub commission: f64,

    pub resulting_cash: f64,

    //only set on sells
    pub realized_profit: Option<f64>,
}

impl Trade {
    pub fn buy(
        timestamp: DateTime<Utc>,
        price: f64,
        quantity: f64,
        cost: f64,
        resulting_cash: f64,
    ) -> Self {
        Trade {
            timestamp,
            action: TradeAction::Buy,
            price,
            quantity,
            value: cost,
            commission: (cost - quantity * price).abs(),
            resulting_cash,
            realized_profit: None,
        }
    }

    pub fn sell(
        timestamp: DateTime<Utc>,
        price: f64,
        quantity: f64,
        revenue: f64,
        resulting_cash: f64,
        realized_profit: f64,
    ) -> Self {
        Trade {
            timestamp,
            action: TradeAction::Sell,
            price,
            quantity,
            value: revenue,
            commission: (quantity * price - revenue).abs(),
            resulting_cash,
            realized_profit: Some(realized_profit),
        }
    }

    //returns the notional value of the trade before commission
    pub fn notional_value(&self) -> f64 {
        self.price * self.quantity
    }

    pub fn is_sell(&self) -> bool {
        self.action == TradeAction::Sell
    }
}

//a proposal refused by the affordability gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedTrade {
    pub timestamp: DateTime<Utc>,
    pub action: TradeAction,
    pub price: f64,
    pub quantity: f64,
    pub value: f64,
    pub reason: TradeRejection,
}
