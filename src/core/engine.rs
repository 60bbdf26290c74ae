// src/core/engine.rs
use crate::config::{Allocation, TradingConfig};
use crate::connectors::traits::ExchangeClient;
use crate::core::cache::MarketDataCache;
use crate::core::positions::PositionTracker;
use crate::strategies::traits::Strategy;
use crate::types::{Decision, ExitReason, Gate, Position, Side};
use crate::utils::precision::{order_quantity, round_down, QUANTITY_DECIMALS};
use chrono::Utc;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Per-symbol FLAT / IN_POSITION state machine driven by [`TradingEngine::tick`].
pub struct TradingEngine<C, S> {
    config: TradingConfig,
    client: C,
    cache: MarketDataCache,
    positions: PositionTracker,
    strategy: S,
}

impl<C, S> TradingEngine<C, S>
where
    C: ExchangeClient,
    S: Strategy,
{
    pub fn new(config: TradingConfig, client: C, cache: MarketDataCache, strategy: S) -> Self {
        let positions = PositionTracker::new(config.portfolio.iter().map(|a| a.symbol.as_str()));
        Self {
            config,
            client,
            cache,
            positions,
            strategy,
        }
    }

    pub fn positions(&self) -> &PositionTracker {
        &self.positions
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn cache(&self) -> &MarketDataCache {
        &self.cache
    }

    /// Runs `tick` every `tick_interval_secs` until Ctrl+C.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        info!(
            strategy = %self.strategy.name(),
            symbols = self.config.portfolio.len(),
            tick_secs = self.config.tick_interval_secs,
            "Engine loop running"
        );

        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.tick_interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick(Utc::now().timestamp()).await;
                }
                res = &mut shutdown => {
                    if let Err(e) = res {
                        warn!("Failed to listen for Ctrl+C: {}", e);
                    }
                    info!("Shutdown requested, leaving engine loop");
                    for pos in self.positions.iter().filter(|p| p.in_position) {
                        info!(
                            symbol = %pos.symbol,
                            entry = pos.entry_price,
                            qty = pos.quantity,
                            "Position left open"
                        );
                    }
                    return Ok(());
                }
            }
        }
    }

    /// Evaluates every symbol once, in portfolio order.
    pub async fn tick(&mut self, now: i64) -> Vec<(String, Decision)> {
        let portfolio = self.config.portfolio.clone();
        let mut decisions = Vec::with_capacity(portfolio.len());

        for allocation in &portfolio {
            let Some(position) = self.positions.get(&allocation.symbol).cloned() else {
                continue;
            };

            let decision = if position.in_position {
                self.evaluate_exit(&position, now).await
            } else {
                self.evaluate_entry(allocation, &position, now).await
            };

            match &decision {
                Decision::Skipped(gate) => {
                    debug!(symbol = %allocation.symbol, ?gate, "No action");
                }
                Decision::Hold => {
                    debug!(symbol = %allocation.symbol, "Holding position");
                }
                _ => {}
            }
            decisions.push((allocation.symbol.clone(), decision));
        }

        decisions
    }

    async fn evaluate_entry(
        &mut self,
        allocation: &Allocation,
        position: &Position,
        now: i64,
    ) -> Decision {
        let symbol = allocation.symbol.as_str();
        let budget = allocation.quote_budget;

        if now - position.last_entry_timestamp < self.config.buy_interval_secs {
            return Decision::Skipped(Gate::Cooldown);
        }

        let volume = self.cache.quote_volume_24h(&self.client, symbol, now).await;
        if volume < self.config.volume_threshold {
            return Decision::Skipped(Gate::Volume);
        }

        let balance = self.client.free_balance(&self.config.quote_asset).await;
        if balance < budget {
            debug!(%symbol, balance, budget, "Not enough {} to buy", self.config.quote_asset);
            return Decision::Skipped(Gate::Balance);
        }

        let closes = self
            .cache
            .recent_closes(
                &self.client,
                symbol,
                self.config.candle_interval,
                self.config.kline_limit,
                now,
            )
            .await;
        let Some(snapshot) = self.strategy.evaluate(&closes) else {
            return Decision::Skipped(Gate::InsufficientData);
        };
        if !self.strategy.should_enter(&snapshot) {
            debug!(%symbol, rsi = snapshot.rsi, hist = snapshot.histogram, "No entry signal");
            return Decision::Skipped(Gate::Signal);
        }

        let price = self.cache.current_price(&self.client, symbol).await;
        if price <= 0.0 {
            return Decision::Skipped(Gate::Price);
        }

        let quantity = order_quantity(budget, price);
        if quantity <= 0.0 {
            warn!(
                %symbol,
                budget,
                price,
                "Budget too small for a {}-decimal lot",
                QUANTITY_DECIMALS
            );
            return Decision::Skipped(Gate::ZeroQuantity);
        }

        info!(
            %symbol,
            rsi = snapshot.rsi,
            hist = snapshot.histogram,
            price,
            quantity,
            "Entry signal"
        );
        let fill = self.client.place_market_order(symbol, Side::Buy, quantity).await;
        if !fill.is_filled() {
            return Decision::Skipped(Gate::NoFill);
        }

        self.positions
            .open_position(symbol, fill.average_price, fill.filled_quantity, now);
        info!(
            %symbol,
            price = fill.average_price,
            qty = fill.filled_quantity,
            "Bought"
        );
        Decision::Entered {
            price: fill.average_price,
            quantity: fill.filled_quantity,
        }
    }

    async fn evaluate_exit(&mut self, position: &Position, now: i64) -> Decision {
        let symbol = position.symbol.as_str();

        let price = self.cache.current_price(&self.client, symbol).await;
        if price <= 0.0 || position.entry_price <= 0.0 {
            return Decision::Skipped(Gate::Price);
        }

        let reason = match price_exit(
            price,
            position.entry_price,
            self.config.stop_loss_pct,
            self.config.take_profit_pct,
        ) {
            Some(reason) => reason,
            None => {
                let closes = self
                    .cache
                    .recent_closes(
                        &self.client,
                        symbol,
                        self.config.candle_interval,
                        self.config.kline_limit,
                        now,
                    )
                    .await;
                let Some(snapshot) = self.strategy.evaluate(&closes) else {
                    return Decision::Skipped(Gate::InsufficientData);
                };
                if !self.strategy.should_exit(&snapshot) {
                    return Decision::Hold;
                }
                ExitReason::SignalReversal
            }
        };

        self.close(position, reason, price).await
    }

    /// Sells the whole free balance of the base asset.
    async fn close(&mut self, position: &Position, reason: ExitReason, price: f64) -> Decision {
        let symbol = position.symbol.as_str();
        let base = symbol
            .strip_suffix(self.config.quote_asset.as_str())
            .unwrap_or(symbol);

        info!(
            %symbol,
            %reason,
            price,
            entry = position.entry_price,
            "Exit triggered"
        );

        let balance = self.client.free_balance(base).await;
        if balance <= 0.0 {
            warn!(%symbol, asset = base, "Exit triggered but no free balance to sell");
            return Decision::Skipped(Gate::NoBaseBalance);
        }

        let quantity = round_down(balance, QUANTITY_DECIMALS);
        let fill = self.client.place_market_order(symbol, Side::Sell, quantity).await;
        if !fill.is_filled() {
            // Retried next tick if the condition still holds.
            return Decision::Skipped(Gate::NoFill);
        }

        self.positions.close_position(symbol);
        info!(
            %symbol,
            %reason,
            price = fill.average_price,
            qty = fill.filled_quantity,
            "Sold"
        );
        Decision::Exited {
            reason,
            price: fill.average_price,
            quantity: fill.filled_quantity,
        }
    }
}

/// Decimal places kept when comparing prices against exit bounds.
const PRICE_COMPARE_DP: u32 = 12;

/// Stop-loss, then take-profit. Both bounds are inclusive: a bound holds if
/// it holds in `f64` or in decimal, so a price equal to either rendering of
/// the bound (e.g. `100 * (1 + 0.1)` as 110) triggers.
fn price_exit(
    price: f64,
    entry: f64,
    stop_loss_pct: f64,
    take_profit_pct: f64,
) -> Option<ExitReason> {
    let as_decimal = |v: f64| Decimal::from_f64(v).map(|d| d.round_dp(PRICE_COMPARE_DP));
    let decimals = (
        as_decimal(price),
        as_decimal(entry),
        as_decimal(stop_loss_pct),
        as_decimal(take_profit_pct),
    );

    let (hit_stop, hit_target) = match decimals {
        (Some(price), Some(entry), Some(sl), Some(tp)) => (
            price <= entry * (Decimal::ONE - sl),
            price >= entry * (Decimal::ONE + tp),
        ),
        _ => (false, false),
    };

    if hit_stop || price <= entry * (1.0 - stop_loss_pct) {
        Some(ExitReason::StopLoss)
    } else if hit_target || price >= entry * (1.0 + take_profit_pct) {
        Some(ExitReason::TakeProfit)
    } else {
        None
    }
}
