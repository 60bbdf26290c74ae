// src/config.rs

use crate::error::ConfigError;
use crate::types::KlineInterval;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use std::fmt;

/// Quote budget for one symbol's opening buy.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Allocation {
    pub symbol: String,
    pub quote_budget: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TradingConfig {
    /// Evaluated in this order every tick.
    pub portfolio: Vec<Allocation>,
    pub quote_asset: String,
    /// Re-entry cooldown, counted from the last opening buy.
    pub buy_interval_secs: i64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub rsi_period: usize,
    pub buy_rsi_threshold: f64,
    pub sell_rsi_threshold: f64,
    pub macd_short_window: usize,
    pub macd_long_window: usize,
    pub macd_signal_window: usize,
    pub candle_interval: KlineInterval,
    pub kline_limit: u16,
    /// Minimum 24h quote volume before a symbol may be bought.
    pub volume_threshold: f64,
    /// Freshness window for cached volume and candles.
    pub refresh_interval_secs: i64,
    pub tick_interval_secs: u64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            portfolio: vec![
                Allocation {
                    symbol: "BTCUSDT".to_string(),
                    quote_budget: 80.0,
                },
                Allocation {
                    symbol: "ETHUSDT".to_string(),
                    quote_budget: 40.0,
                },
            ],
            quote_asset: "USDT".to_string(),
            buy_interval_secs: 3600,
            stop_loss_pct: 0.05,
            take_profit_pct: 0.1,
            rsi_period: 14,
            buy_rsi_threshold: 30.0,
            sell_rsi_threshold: 70.0,
            macd_short_window: 12,
            macd_long_window: 26,
            macd_signal_window: 9,
            candle_interval: KlineInterval::FifteenMinutes,
            kline_limit: 50,
            volume_threshold: 1e7,
            refresh_interval_secs: 60,
            tick_interval_secs: 10,
        }
    }
}

impl TradingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.portfolio.is_empty() {
            return Err(ConfigError::Invalid("portfolio is empty".into()));
        }
        for allocation in &self.portfolio {
            if allocation.symbol.is_empty() || allocation.quote_budget <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "allocation for '{}' must have a positive budget",
                    allocation.symbol
                )));
            }
            if !allocation.symbol.ends_with(&self.quote_asset) {
                return Err(ConfigError::Invalid(format!(
                    "symbol {} is not quoted in {}",
                    allocation.symbol, self.quote_asset
                )));
            }
        }
        if self.rsi_period == 0
            || self.macd_short_window == 0
            || self.macd_signal_window == 0
        {
            return Err(ConfigError::Invalid("indicator windows must be positive".into()));
        }
        if self.macd_short_window >= self.macd_long_window {
            return Err(ConfigError::Invalid(
                "macd_short_window must be smaller than macd_long_window".into(),
            ));
        }
        if usize::from(self.kline_limit) < self.macd_long_window {
            return Err(ConfigError::Invalid(format!(
                "kline_limit {} cannot feed a MACD long window of {}",
                self.kline_limit, self.macd_long_window
            )));
        }
        for (name, pct) in [
            ("stop_loss_pct", self.stop_loss_pct),
            ("take_profit_pct", self.take_profit_pct),
        ] {
            if !(pct > 0.0 && pct < 1.0) {
                return Err(ConfigError::Invalid(format!("{} must be in (0, 1)", name)));
            }
        }
        for (name, threshold) in [
            ("buy_rsi_threshold", self.buy_rsi_threshold),
            ("sell_rsi_threshold", self.sell_rsi_threshold),
        ] {
            if !(0.0..=100.0).contains(&threshold) {
                return Err(ConfigError::Invalid(format!("{} must be in [0, 100]", name)));
            }
        }
        if self.refresh_interval_secs < 0 || self.buy_interval_secs < 0 {
            return Err(ConfigError::Invalid("intervals cannot be negative".into()));
        }
        if self.tick_interval_secs == 0 {
            return Err(ConfigError::Invalid("tick_interval_secs must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Overrides the mainnet/testnet URL when set.
    pub base_url: Option<String>,
    pub testnet: bool,
    pub timeout_secs: u64,
    pub recv_window: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            testnet: false,
            timeout_secs: 10,
            recv_window: 5000,
            max_retries: 3,
            retry_backoff_ms: 2000,
        }
    }
}

impl ExchangeConfig {
    pub fn rest_base_url(&self) -> &str {
        match &self.base_url {
            Some(url) => url,
            None if self.testnet => "https://testnet.binance.vision",
            None => "https://api.binance.com",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LogConfig {
    pub directory: String,
    pub file_prefix: String,
    /// `EnvFilter` directive; `RUST_LOG` wins when set.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            file_prefix: "spot-agent.log".to_string(),
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub trading: TradingConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// Paper trading unless explicitly switched on.
    #[serde(default)]
    pub live_trading: bool,
    #[serde(default = "default_paper_quote_balance")]
    pub paper_quote_balance: f64,
}

fn default_paper_quote_balance() -> f64 {
    1000.0
}

impl AppConfig {
    /// Optional `Settings.toml`, then `APP__SECTION__KEY` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("Settings").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"));

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.trading.validate()?;
        Ok(config)
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    /// Reads `BINANCE_API_KEY` / `BINANCE_API_SECRET`; both must be non-empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: required_var("BINANCE_API_KEY")?,
            api_secret: required_var("BINANCE_API_SECRET")?,
        })
    }
}

fn required_var(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingCredential(name)),
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked_key = if self.api_key.chars().count() > 8 {
            let head: String = self.api_key.chars().take(4).collect();
            let mut tail: Vec<char> = self.api_key.chars().rev().take(4).collect();
            tail.reverse();
            format!("{}...{}", head, tail.into_iter().collect::<String>())
        } else {
            "***REDACTED***".to_string()
        };
        f.debug_struct("Credentials")
            .field("api_key", &masked_key)
            .field("api_secret", &"***REDACTED***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_defaults_are_valid() {
        let trading = TradingConfig::default();
        assert!(trading.validate().is_ok());
        assert_eq!(trading.portfolio.len(), 2);
        assert_eq!(trading.candle_interval, KlineInterval::FifteenMinutes);
    }

    #[test]
    fn test_settings_from_toml() {
        let toml = r#"
            live_trading = true

            [trading]
            buy_interval_secs = 600
            candle_interval = "1h"

            [[trading.portfolio]]
            symbol = "SOLUSDT"
            quote_budget = 25.0

            [exchange]
            max_retries = 5
        "#;

        let config: AppConfig = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(config.live_trading);
        assert_eq!(config.paper_quote_balance, 1000.0);
        assert_eq!(config.trading.buy_interval_secs, 600);
        assert_eq!(config.trading.candle_interval, KlineInterval::OneHour);
        assert_eq!(
            config.trading.portfolio,
            vec![Allocation {
                symbol: "SOLUSDT".to_string(),
                quote_budget: 25.0
            }]
        );
        // Untouched keys keep their defaults.
        assert_eq!(config.trading.rsi_period, 14);
        assert_eq!(config.exchange.max_retries, 5);
        assert_eq!(config.exchange.timeout_secs, 10);
        assert_eq!(config.exchange.rest_base_url(), "https://api.binance.com");
    }

    #[test]
    fn test_validation_rejects_bad_windows() {
        let mut trading = TradingConfig::default();
        trading.macd_short_window = 26;
        assert!(matches!(trading.validate(), Err(ConfigError::Invalid(_))));

        let mut trading = TradingConfig::default();
        trading.kline_limit = 20;
        assert!(trading.validate().is_err());

        let mut trading = TradingConfig::default();
        trading.stop_loss_pct = 1.5;
        assert!(trading.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_foreign_quote() {
        let mut trading = TradingConfig::default();
        trading.portfolio.push(Allocation {
            symbol: "ETHBTC".to_string(),
            quote_budget: 1.0,
        });
        assert!(trading.validate().is_err());
    }

    #[test]
    fn test_credentials_debug_is_masked() {
        let creds = Credentials {
            api_key: "abcdefghijklmnop".to_string(),
            api_secret: "super-secret".to_string(),
        };
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("abcd...mnop"));
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn test_credentials_debug_with_multibyte_key() {
        let creds = Credentials {
            api_key: "ключключключ".to_string(),
            api_secret: "s".to_string(),
        };
        assert!(format!("{:?}", creds).contains("ключ...ключ"));
    }

    #[test]
    fn test_testnet_url() {
        let exchange = ExchangeConfig {
            testnet: true,
            ..ExchangeConfig::default()
        };
        assert_eq!(exchange.rest_base_url(), "https://testnet.binance.vision");
    }
}
