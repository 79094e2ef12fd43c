use serde::{Deserialize, Serialize};

/// Discrete trading decision derived from a price window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// 1 for buy, -1 for sell, 0 for hold.
    pub fn direction(self) -> i8 {
        match self {
            Signal::Buy => 1,
            Signal::Sell => -1,
            Signal::Hold => 0,
        }
    }
}
