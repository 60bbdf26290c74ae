// src/connectors/paper.rs
use crate::connectors::traits::ExchangeClient;
use crate::error::ExchangeError;
use crate::types::{KlineInterval, OrderFill, Side};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{info, warn};

/// Paper trading: market data comes from the wrapped client, balances and
/// fills are simulated in memory. Market orders fill completely at the
/// current price or not at all.
pub struct PaperExchange<C> {
    inner: C,
    quote_asset: String,
    balances: Mutex<HashMap<String, f64>>,
}

impl<C: ExchangeClient> PaperExchange<C> {
    pub fn new(inner: C, quote_asset: &str, quote_balance: f64) -> Self {
        let mut balances = HashMap::new();
        balances.insert(quote_asset.to_string(), quote_balance);
        Self {
            inner,
            quote_asset: quote_asset.to_string(),
            balances: Mutex::new(balances),
        }
    }

    fn balance(&self, asset: &str) -> f64 {
        let balances = self.balances.lock().unwrap_or_else(|e| e.into_inner());
        balances.get(asset).copied().unwrap_or(0.0)
    }

    fn base_asset<'a>(&self, symbol: &'a str) -> Option<&'a str> {
        symbol.strip_suffix(self.quote_asset.as_str())
    }

    /// Applies a fill to the simulated balances if they cover it.
    fn settle(&self, base: &str, side: Side, price: f64, quantity: f64) -> bool {
        let mut balances = self.balances.lock().unwrap_or_else(|e| e.into_inner());
        let cost = price * quantity;
        let quote = balances.get(&self.quote_asset).copied().unwrap_or(0.0);
        let held = balances.get(base).copied().unwrap_or(0.0);

        let (new_quote, new_base) = match side {
            Side::Buy if quote >= cost => (quote - cost, held + quantity),
            Side::Sell if held >= quantity => (quote + cost, held - quantity),
            _ => return false,
        };
        balances.insert(self.quote_asset.clone(), new_quote);
        balances.insert(base.to_string(), new_base);
        true
    }
}

#[async_trait]
impl<C: ExchangeClient> ExchangeClient for PaperExchange<C> {
    async fn ping(&self) -> Result<(), ExchangeError> {
        self.inner.ping().await
    }

    async fn current_price(&self, symbol: &str) -> f64 {
        self.inner.current_price(symbol).await
    }

    async fn quote_volume_24h(&self, symbol: &str) -> f64 {
        self.inner.quote_volume_24h(symbol).await
    }

    async fn recent_closes(&self, symbol: &str, interval: KlineInterval, limit: u16) -> Vec<f64> {
        self.inner.recent_closes(symbol, interval, limit).await
    }

    async fn free_balance(&self, asset: &str) -> f64 {
        self.balance(asset)
    }

    async fn place_market_order(&self, symbol: &str, side: Side, quantity: f64) -> OrderFill {
        let Some(base) = self.base_asset(symbol) else {
            warn!(%symbol, "Paper order on a symbol not quoted in {}", self.quote_asset);
            return OrderFill::default();
        };
        if quantity <= 0.0 {
            return OrderFill::default();
        }

        let price = self.inner.current_price(symbol).await;
        if price <= 0.0 {
            warn!(%symbol, "Paper order skipped: no price");
            return OrderFill::default();
        }

        if !self.settle(base, side, price, quantity) {
            warn!(%symbol, %side, quantity, "Paper order rejected: insufficient balance");
            return OrderFill::default();
        }

        info!(
            %symbol,
            %side,
            quantity,
            price,
            quote_balance = self.balance(&self.quote_asset),
            "📝 Paper fill"
        );
        OrderFill {
            average_price: price,
            filled_quantity: quantity,
        }
    }
}
