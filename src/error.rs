//! Error types, one enum per concern.

use thiserror::Error;

/// Why a statistic could not be computed. Recoverable: the strategy folds
/// every variant into `Signal::Hold`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    #[error("insufficient data for {statistic}: required {required}, available {available}")]
    InsufficientData {
        statistic: &'static str,
        required: usize,
        available: usize,
    },
    #[error("price {price} at index {index} cannot be log-transformed")]
    InvalidPrice { index: usize, price: f64 },
    #[error("invalid strategy config: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("no open position for {0}")]
    NotFound(String),
}

/// Signer construction failures. Fatal: a bot without a key cannot talk to
/// the brokerage.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("key configuration error: {0}")]
    Configuration(String),
    #[error("failed to load private key: {0}")]
    KeyLoad(String),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not logged in")]
    NotLoggedIn,
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("invalid order: {0}")]
    InvalidOrder(String),
    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}
