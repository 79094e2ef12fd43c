//! Runtime configuration from the process environment (`.env` supported).

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "https://trading.robinhood.com";

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct Config {
    pub credentials: Credentials,
    /// Inline PEM key; mutually exclusive with `private_key_path`.
    pub private_key_pem: Option<String>,
    pub private_key_path: Option<PathBuf>,
    pub api_url: String,
    pub symbols: Vec<String>,
    pub order_quantity: f64,
    pub poll_interval: Duration,
    pub dry_run: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("credentials", &self.credentials)
            .field("private_key_pem", &self.private_key_pem.as_ref().map(|_| "<redacted>"))
            .field("private_key_path", &self.private_key_path)
            .field("api_url", &self.api_url)
            .field("symbols", &self.symbols)
            .field("order_quantity", &self.order_quantity)
            .field("poll_interval", &self.poll_interval)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let credentials = Credentials {
            username: required("ROBINHOOD_USERNAME")?,
            password: required("ROBINHOOD_PASSWORD")?,
        };

        let symbols: Vec<String> = get("TRADING_SYMBOLS")
            .unwrap_or_else(|| "BTC-USD".to_string())
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        if symbols.is_empty() {
            return Err(ConfigError::Invalid {
                var: "TRADING_SYMBOLS",
                value: get("TRADING_SYMBOLS").unwrap_or_default(),
            });
        }

        let order_quantity: f64 = parse_or(&get, "ORDER_QUANTITY", 1.0)?;
        if !(order_quantity.is_finite() && order_quantity > 0.0) {
            return Err(ConfigError::Invalid {
                var: "ORDER_QUANTITY",
                value: order_quantity.to_string(),
            });
        }

        let poll_secs: u64 = parse_or(&get, "POLL_INTERVAL_SECS", 60)?;
        if poll_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "POLL_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            credentials,
            private_key_pem: get("ROBINHOOD_PRIVATE_KEY"),
            private_key_path: get("ROBINHOOD_PRIVATE_KEY_PATH").map(PathBuf::from),
            api_url: get("ROBINHOOD_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            symbols,
            order_quantity,
            poll_interval: Duration::from_secs(poll_secs),
            dry_run: parse_or(&get, "DRY_RUN", true)?,
        })
    }
}

fn parse_or<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}
