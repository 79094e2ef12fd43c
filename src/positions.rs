//! Position tracking: open_or_adjust, close, unrealized_pnl.
//! Testable without HTTP.
//!
//! The ledger does no internal locking; mutation takes `&mut self`, so a
//! caller sharing it across tasks must wrap it (e.g. in a `tokio::sync::Mutex`).

use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::LedgerError;
use crate::types::order::{Price, Qty};
use crate::types::position::Position;

/// What a fill did to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    Opened,
    Adjusted,
    /// Quantity netted to exactly zero and the position was removed.
    Closed,
    /// Zero-quantity fill on a symbol with no position.
    Ignored,
}

#[derive(Debug, Default, Clone)]
pub struct PositionLedger {
    positions: HashMap<String, Position>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one fill: create the position, or blend it into the existing one
    /// with weighted-average cost. Removes the position when quantity nets to 0.
    ///
    /// Fills that flip the sign of the position go through the same averaging
    /// formula; no P&L is realized on the portion that closed the old side.
    pub fn open_or_adjust(&mut self, symbol: &str, quantity: Qty, price: Price) -> FillOutcome {
        match self.positions.get_mut(symbol) {
            Some(pos) => {
                let new_qty = pos.quantity + quantity;

                if new_qty == 0.0 {
                    self.positions.remove(symbol);
                    info!(symbol, "closed position by netting fill");
                    return FillOutcome::Closed;
                }

                let total_value = pos.quantity * pos.average_price + quantity * price;
                pos.quantity = new_qty;
                pos.average_price = total_value / new_qty;
                info!(
                    symbol,
                    quantity = pos.quantity,
                    average_price = pos.average_price,
                    "updated position"
                );
                FillOutcome::Adjusted
            }
            None => {
                if quantity == 0.0 {
                    warn!(symbol, "cannot open position with zero quantity");
                    return FillOutcome::Ignored;
                }
                self.positions.insert(
                    symbol.to_string(),
                    Position {
                        symbol: symbol.to_string(),
                        quantity,
                        average_price: price,
                    },
                );
                info!(symbol, quantity, average_price = price, "opened position");
                FillOutcome::Opened
            }
        }
    }

    /// Remove the position and return its realized P&L at `price`.
    pub fn close(&mut self, symbol: &str, price: Price) -> Result<f64, LedgerError> {
        let Some(pos) = self.positions.remove(symbol) else {
            warn!(symbol, "cannot close position: none exists");
            return Err(LedgerError::NotFound(symbol.to_string()));
        };
        let pnl = pos.pnl_at(price);
        info!(symbol, profit_loss = pnl, "closed position");
        Ok(pnl)
    }

    pub fn get(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    /// Unrealized P&L: (current_price - average_price) * quantity. Works for long and short.
    pub fn unrealized_pnl(&self, symbol: &str, current_price: Price) -> Result<f64, LedgerError> {
        match self.positions.get(symbol) {
            Some(pos) => Ok(pos.pnl_at(current_price)),
            None => {
                warn!(symbol, "no position found to calculate P&L");
                Err(LedgerError::NotFound(symbol.to_string()))
            }
        }
    }

    pub fn all(&self) -> &HashMap<String, Position> {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
