// Automated spot-trading agent: polls Binance market data, computes
// RSI/MACD and trades a per-symbol quote budget with stop-loss,
// take-profit and volume gating.

pub mod config;
pub mod connectors;
pub mod core;
pub mod error;
pub mod indicators;
pub mod strategies;
pub mod telemetry;
pub mod types;
pub mod utils;
