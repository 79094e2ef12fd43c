use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::order::Price;

/// Top-of-book quote for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub bid_price: Price,
    pub ask_price: Price,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    pub fn mid_price(&self) -> Price {
        (self.bid_price + self.ask_price) / 2.0
    }
}
