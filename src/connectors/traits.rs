use crate::error::ExchangeError;
use crate::types::{KlineInterval, OrderFill, Side};
use async_trait::async_trait;

/// What the trading engine needs from an exchange.
///
/// Everything except `ping` is infallible at this boundary: implementations
/// log their own failures and return 0, an empty series or a zero fill,
/// which the engine reads as "gate not satisfied".
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    async fn ping(&self) -> Result<(), ExchangeError>;

    async fn current_price(&self, symbol: &str) -> f64;

    async fn quote_volume_24h(&self, symbol: &str) -> f64;

    /// Close prices of the last `limit` candles, oldest first.
    async fn recent_closes(&self, symbol: &str, interval: KlineInterval, limit: u16) -> Vec<f64>;

    async fn free_balance(&self, asset: &str) -> f64;

    async fn place_market_order(&self, symbol: &str, side: Side, quantity: f64) -> OrderFill;
}
