use serde::{Deserialize, Serialize};

use crate::types::order::Price;

/// Position per symbol. Quantity is signed: positive = long, negative = short.
/// A stored position never has a quantity of exactly zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: f64,
    pub average_price: Price,
}

impl Position {
    /// (price - average_price) * quantity. Works for long and short.
    pub fn pnl_at(&self, price: Price) -> f64 {
        (price - self.average_price) * self.quantity
    }
}
