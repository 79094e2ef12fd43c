pub mod momentum;

pub use momentum::{MomentumStrategy, StrategyConfig};
