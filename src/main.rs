// src/main.rs
use anyhow::Context;
use dotenvy::dotenv;
use spot_agent::config::{AppConfig, Credentials};
use spot_agent::connectors::{BinanceClient, ExchangeClient, PaperExchange};
use spot_agent::core::{MarketDataCache, TradingEngine};
use spot_agent::strategies::RsiMacdStrategy;
use spot_agent::telemetry;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // 1. Load Configuration
    let config = AppConfig::load().context("Invalid configuration")?;
    let credentials = Credentials::from_env().context("Missing exchange credentials")?;
    let _log_guard = telemetry::init(&config.log)?;

    info!("========================================");
    info!("        SPOT AGENT - v{}", env!("CARGO_PKG_VERSION"));
    info!("========================================");
    for allocation in &config.trading.portfolio {
        info!(
            "Target: {} ({} {})",
            allocation.symbol, allocation.quote_budget, config.trading.quote_asset
        );
    }
    info!(
        "Mode:   {}",
        if config.live_trading {
            "🚨 LIVE TRADING"
        } else {
            "📝 PAPER TRADING"
        }
    );
    info!("========================================");

    // 2. Initialize Components
    let client = BinanceClient::new(credentials, &config.exchange)?;
    client
        .ping()
        .await
        .context("Binance ping failed, refusing to start")?;
    info!("Binance ping OK");

    let cache = MarketDataCache::new(config.trading.refresh_interval_secs);
    let strategy = RsiMacdStrategy::new(&config.trading);

    // 3. Run Engine
    if config.live_trading {
        let mut engine = TradingEngine::new(config.trading, client, cache, strategy);
        engine.run().await
    } else {
        let paper = PaperExchange::new(
            client,
            &config.trading.quote_asset,
            config.paper_quote_balance,
        );
        let mut engine = TradingEngine::new(config.trading, paper, cache, strategy);
        engine.run().await
    }
}
