//! Volatility-adjusted momentum with a mean-reversion entry filter.
//!
//! All statistics take prices oldest first, most recent last.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::SignalError;
use crate::types::order::Price;
use crate::types::signal::Signal;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Steps back for the momentum log return.
    pub lookback_window: usize,
    /// Number of recent log returns in the volatility estimate.
    pub volatility_window: usize,
    /// Moving-average length for the mean-reversion deviation.
    pub mean_reversion_window: usize,
    pub momentum_threshold: f64,
    pub mean_reversion_threshold: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            lookback_window: 20,
            volatility_window: 20,
            mean_reversion_window: 5,
            momentum_threshold: 0.025,
            mean_reversion_threshold: 0.005,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MomentumStrategy {
    config: StrategyConfig,
}

impl MomentumStrategy {
    pub fn new(config: StrategyConfig) -> Result<Self, SignalError> {
        for (name, window) in [
            ("lookback_window", config.lookback_window),
            ("volatility_window", config.volatility_window),
            ("mean_reversion_window", config.mean_reversion_window),
        ] {
            if window == 0 {
                return Err(SignalError::InvalidConfig(format!("{name} must be >= 1")));
            }
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Longest price history any statistic looks at.
    pub fn required_history(&self) -> usize {
        self.config
            .lookback_window
            .max(self.config.volatility_window)
            .max(self.config.mean_reversion_window)
    }

    /// Log return over `lookback_window` steps: ln(p[-1]) - ln(p[-1-lookback]).
    /// With exactly `lookback_window` prices the first price is the base.
    pub fn momentum(&self, prices: &[Price]) -> Result<f64, SignalError> {
        let window = self.config.lookback_window;
        require(prices, window, "momentum")?;
        let last = prices.len() - 1;
        let base = last.saturating_sub(window);
        Ok(ln(prices, last)? - ln(prices, base)?)
    }

    /// Sample standard deviation of the last `volatility_window` per-step log returns.
    pub fn volatility(&self, prices: &[Price]) -> Result<f64, SignalError> {
        let window = self.config.volatility_window;
        require(prices, window, "volatility")?;

        // Only the prices feeding the last `window` returns are checked.
        let start = prices.len().saturating_sub(window + 1);
        let logs = (start..prices.len())
            .map(|i| ln(prices, i))
            .collect::<Result<Vec<_>, _>>()?;
        let returns: Vec<f64> = logs.windows(2).map(|w| w[1] - w[0]).collect();
        let recent = &returns[returns.len().saturating_sub(window)..];

        Ok(sample_std(recent))
    }

    /// Latest price minus the simple moving average of the last `mean_reversion_window` prices.
    pub fn mean_reversion(&self, prices: &[Price]) -> Result<f64, SignalError> {
        let window = self.config.mean_reversion_window;
        require(prices, window, "mean reversion")?;
        let recent = &prices[prices.len() - window..];
        let moving_average = recent.iter().sum::<f64>() / window as f64;
        Ok(prices[prices.len() - 1] - moving_average)
    }

    /// Trend call gated by mean reversion: buy a rising market on a dip below
    /// its short average, sell a falling one on a pop above it. Any statistic
    /// that cannot be computed yields Hold.
    pub fn generate_signal(&self, prices: &[Price]) -> Signal {
        let (momentum, volatility, mean_reversion) = match self.statistics(prices) {
            Ok(stats) => stats,
            Err(e) => {
                warn!(error = %e, "no signal");
                return Signal::Hold;
            }
        };

        let adjusted_momentum = if volatility > 0.0 {
            momentum / volatility
        } else {
            0.0
        };

        let cfg = &self.config;
        if adjusted_momentum > cfg.momentum_threshold
            && mean_reversion < -cfg.mean_reversion_threshold
        {
            info!(adjusted_momentum, mean_reversion, "buy signal");
            Signal::Buy
        } else if adjusted_momentum < -cfg.momentum_threshold
            && mean_reversion > cfg.mean_reversion_threshold
        {
            info!(adjusted_momentum, mean_reversion, "sell signal");
            Signal::Sell
        } else {
            Signal::Hold
        }
    }

    fn statistics(&self, prices: &[Price]) -> Result<(f64, f64, f64), SignalError> {
        Ok((
            self.momentum(prices)?,
            self.volatility(prices)?,
            self.mean_reversion(prices)?,
        ))
    }
}

fn require(prices: &[Price], window: usize, statistic: &'static str) -> Result<(), SignalError> {
    if prices.len() < window {
        return Err(SignalError::InsufficientData {
            statistic,
            required: window,
            available: prices.len(),
        });
    }
    Ok(())
}

fn ln(prices: &[Price], index: usize) -> Result<f64, SignalError> {
    let price = prices[index];
    if !price.is_finite() || price <= 0.0 {
        return Err(SignalError::InvalidPrice { index, price });
    }
    Ok(price.ln())
}

// Fewer than two samples has no spread to measure.
fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_std_uses_n_minus_one() {
        // mean 2, squared deviations 1 + 0 + 1 = 2, / (3 - 1) = 1
        assert!((sample_std(&[1.0, 2.0, 3.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn sample_std_single_value_is_zero() {
        assert_eq!(sample_std(&[0.5]), 0.0);
        assert_eq!(sample_std(&[]), 0.0);
    }
}
