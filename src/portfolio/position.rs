use serde::{Deserialize, Serialize};

//holdings below this are residue from repeated fractional sells
pub const DUST_TOLERANCE: f64 = 1e-8;

//long-only holding in a single instrument with a blended entry price
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    //held quantity, never negative
    pub quantity: f64,

    //weighted average entry price, 0 while flat
    pub avg_entry_price: f64,
}

impl Position {
    pub fn new() -> Self {
        Position::default()
    }

    //returns true if nothing is held
    pub fn is_flat(&self) -> bool {
        self.quantity == 0.0
    }

    //adds to the position, re-weighting the entry price
    pub fn add(&mut self, quantity: f64, price: f64) {
        let total = self.quantity + quantity;
        if total <= 0.0 {
            return;
        }
        self.avg_entry_price = (self.quantity * self.avg_entry_price + quantity * price) / total;
        self.quantity = total;
    }

    //removes quantity sold for `revenue` and returns the realized profit
    //remainders below the dust tolerance are snapped to flat
    pub fn reduce(&mut self, quantity: f64, revenue: f64) -> f64 {
        let sold = quantity.min(self.quantity);
        let realized = revenue - sold * self.avg_entry_price;

        self.quantity -= sold;
        if self.quantity < DUST_TOLERANCE {
            self.quantity = 0.0;
            self.avg_entry_price = 0.0;
        }

        realized
    }

    //mark-to-market value at a given price
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    //calculates unrealized pnl at a given price
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        if self.is_flat() {
            return 0.0;
        }
        (price - self.avg_entry_price) * self.quantity
    }
}
