use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type Price = f64;
pub type Qty = f64;
pub type OrderId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Sign applied to a fill quantity: buys add, sells reduce.
    pub fn sign(self) -> f64 {
        match self {
            OrderSide::Buy => 1.0,
            OrderSide::Sell => -1.0,
        }
    }
}

/// Order type. A limit order carries its price, so it cannot be built without one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OrderKind {
    Market,
    Limit { price: Price },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub client_order_id: OrderId,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Qty,
    #[serde(flatten)]
    pub kind: OrderKind,
}

impl OrderRequest {
    pub fn market(symbol: &str, side: OrderSide, quantity: Qty) -> Self {
        Self {
            client_order_id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            side,
            quantity,
            kind: OrderKind::Market,
        }
    }

    pub fn limit(symbol: &str, side: OrderSide, quantity: Qty, price: Price) -> Self {
        Self {
            kind: OrderKind::Limit { price },
            ..Self::market(symbol, side, quantity)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Open,
    PartiallyFilled,
    Filled,
    Canceled,
    Failed,
}

/// Brokerage acknowledgement of a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub id: String,
    pub client_order_id: OrderId,
    pub symbol: String,
    pub side: OrderSide,
    pub state: OrderState,
    #[serde(default)]
    pub filled_quantity: Qty,
    #[serde(default)]
    pub average_fill_price: Option<Price>,
    pub created_at: DateTime<Utc>,
}
