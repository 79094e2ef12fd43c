//! Personal trading bot: position ledger, momentum signal, signed brokerage requests.

pub mod api;
pub mod bot;
pub mod config;
pub mod error;
pub mod positions;
pub mod strategy;
pub mod types;
