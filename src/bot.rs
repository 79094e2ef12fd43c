//! Trader: quote → price window → signal → market order → fill → ledger.

use std::collections::{HashMap, VecDeque};

use tracing::{info, warn};

use crate::api::client::BrokerClient;
use crate::error::ClientError;
use crate::positions::{FillOutcome, PositionLedger};
use crate::strategy::MomentumStrategy;
use crate::types::order::{OrderRequest, OrderSide, OrderState, Price, Qty};
use crate::types::signal::Signal;

pub struct Trader<C: BrokerClient> {
    client: C,
    strategy: MomentumStrategy,
    ledger: PositionLedger,
    windows: HashMap<String, VecDeque<Price>>,
    order_quantity: Qty,
    dry_run: bool,
}

impl<C: BrokerClient> Trader<C> {
    pub fn new(client: C, strategy: MomentumStrategy, order_quantity: Qty, dry_run: bool) -> Self {
        Self {
            client,
            strategy,
            ledger: PositionLedger::new(),
            windows: HashMap::new(),
            order_quantity,
            dry_run,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    pub fn prices(&self, symbol: &str) -> Option<&VecDeque<Price>> {
        self.windows.get(symbol)
    }

    /// Seed the ledger from brokerage holdings. Returns how many were loaded.
    pub async fn sync_holdings(&mut self) -> Result<usize, ClientError> {
        let holdings = self.client.get_holdings().await?;
        let mut loaded = 0;
        for holding in holdings {
            if self.ledger.get(&holding.symbol).is_some() {
                continue;
            }
            let outcome = self.ledger.open_or_adjust(
                &holding.symbol,
                holding.quantity,
                holding.average_buy_price,
            );
            if outcome != FillOutcome::Ignored {
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// One polling step for `symbol`. Returns the signal acted upon.
    pub async fn tick(&mut self, symbol: &str) -> Result<Signal, ClientError> {
        let quote = self.client.get_quote(symbol).await?;
        let mid = quote.mid_price();

        let capacity = self.strategy.required_history() + 1;
        let window = self.windows.entry(symbol.to_string()).or_default();
        window.push_back(mid);
        while window.len() > capacity {
            window.pop_front();
        }

        let prices = window.make_contiguous();
        let signal = self.strategy.generate_signal(prices);

        let (side, quantity) = match signal {
            Signal::Hold => return Ok(signal),
            Signal::Buy => (OrderSide::Buy, self.order_quantity),
            Signal::Sell => {
                // No shorting: only sell out of an existing long.
                let held = self.ledger.get(symbol).map_or(0.0, |p| p.quantity);
                if held <= 0.0 {
                    info!(symbol, "sell signal without a long position, skipping");
                    return Ok(signal);
                }
                (OrderSide::Sell, self.order_quantity.min(held))
            }
        };

        if self.dry_run {
            info!(symbol, ?side, quantity, price = mid, "dry run, order not placed");
            return Ok(signal);
        }

        let order = OrderRequest::market(symbol, side, quantity);
        let confirmation = self.client.place_order(&order).await?;

        match confirmation.state {
            OrderState::Filled | OrderState::PartiallyFilled if confirmation.filled_quantity > 0.0 => {
                let price = confirmation.average_fill_price.unwrap_or(mid);
                let filled = confirmation.filled_quantity * side.sign();
                self.ledger.open_or_adjust(symbol, filled, price);
            }
            state => {
                warn!(symbol, order_id = %confirmation.id, ?state, "order not filled yet, ledger unchanged");
            }
        }

        Ok(signal)
    }
}
