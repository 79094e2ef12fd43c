use serde::{Deserialize, Serialize};

use crate::types::order::{Price, Qty};

/// A holding as reported by the brokerage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub quantity: Qty,
    pub average_buy_price: Price,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_number: String,
    pub buying_power: f64,
    pub currency: String,
    pub status: String,
}
