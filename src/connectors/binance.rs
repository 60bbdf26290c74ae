// src/connectors/binance.rs
use crate::config::{Credentials, ExchangeConfig};
use crate::connectors::messages::{
    AccountInfo, ApiErrorBody, KlineRow, OrderResponse, PriceTicker, Ticker24h,
};
use crate::connectors::traits::ExchangeClient;
use crate::error::ExchangeError;
use crate::types::{KlineInterval, OrderFill, Side};
use crate::utils::precision::format_quantity;
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Method};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// `-2013 Order does not exist.`
const ORDER_NOT_FOUND: i64 = -2013;

/// Hex HMAC-SHA256 of `payload` keyed with the API secret.
pub fn sign(secret: &str, payload: &str) -> Result<String, ExchangeError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ExchangeError::Signing(e.to_string()))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

pub struct BinanceClient {
    api_key: String,
    secret_key: String,
    http_client: Client,
    base_rest_url: Url,
    recv_window: u64,
    max_retries: u32,
    retry_backoff: Duration,
}

impl BinanceClient {
    pub fn new(credentials: Credentials, config: &ExchangeConfig) -> Result<Self, ExchangeError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let base_rest_url = Url::parse(config.rest_base_url())
            .map_err(|e| ExchangeError::Decode(format!("bad base url: {}", e)))?;

        Ok(Self {
            api_key: credentials.api_key,
            secret_key: credentials.api_secret,
            http_client,
            base_rest_url,
            recv_window: config.recv_window,
            max_retries: config.max_retries.max(1),
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    fn sign_and_build_query(&self, params: &[(&str, String)]) -> Result<String, ExchangeError> {
        let mut params = params.to_vec();
        params.push(("recvWindow", self.recv_window.to_string()));
        params.push(("timestamp", Utc::now().timestamp_millis().to_string()));

        let query_string = serde_urlencoded::to_string(&params)
            .map_err(|e| ExchangeError::Signing(e.to_string()))?;
        let signature = sign(&self.secret_key, &query_string)?;

        Ok(format!("{}&signature={}", query_string, signature))
    }

    fn endpoint_url(&self, endpoint: &str, query: &str) -> Result<Url, ExchangeError> {
        let mut url = self
            .base_rest_url
            .join(endpoint)
            .map_err(|e| ExchangeError::Decode(format!("bad endpoint {}: {}", endpoint, e)))?;
        if !query.is_empty() {
            url.set_query(Some(query));
        }
        Ok(url)
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        method: &Method,
        endpoint: &str,
        params: &[(&str, String)],
        signed: bool,
    ) -> Result<T, ExchangeError> {
        let query = if signed {
            // Fresh timestamp on every attempt.
            self.sign_and_build_query(params)?
        } else {
            serde_urlencoded::to_string(params).map_err(|e| ExchangeError::Decode(e.to_string()))?
        };
        let url = self.endpoint_url(endpoint, &query)?;

        let mut request = self.http_client.request(method.clone(), url);
        if signed {
            request = request.header("X-MBX-APIKEY", &self.api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(api) => ExchangeError::Api {
                    status: status.as_u16(),
                    code: api.code,
                    message: api.msg,
                },
                Err(_) => ExchangeError::Http {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        serde_json::from_str(&body).map_err(|e| ExchangeError::Decode(e.to_string()))
    }

    /// Sends a request, retrying transient failures with a fixed backoff.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, String)],
        signed: bool,
    ) -> Result<T, ExchangeError> {
        let mut attempt = 1;
        loop {
            match self.send_once(&method, endpoint, params, signed).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    warn!(
                        endpoint,
                        attempt,
                        max_attempts = self.max_retries,
                        "Request failed: {}. Retrying in {:?}",
                        e,
                        self.retry_backoff
                    );
                    tokio::time::sleep(self.retry_backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn fetch_price(&self, symbol: &str) -> Result<Decimal, ExchangeError> {
        let ticker: PriceTicker = self
            .request(
                Method::GET,
                "/api/v3/ticker/price",
                &[("symbol", symbol.to_string())],
                false,
            )
            .await?;
        Ok(ticker.price)
    }

    pub async fn fetch_quote_volume(&self, symbol: &str) -> Result<Decimal, ExchangeError> {
        let ticker: Ticker24h = self
            .request(
                Method::GET,
                "/api/v3/ticker/24hr",
                &[("symbol", symbol.to_string())],
                false,
            )
            .await?;
        Ok(ticker.quote_volume)
    }

    pub async fn fetch_closes(
        &self,
        symbol: &str,
        interval: KlineInterval,
        limit: u16,
    ) -> Result<Vec<Decimal>, ExchangeError> {
        let rows: Vec<KlineRow> = self
            .request(
                Method::GET,
                "/api/v3/klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", interval.as_str().to_string()),
                    ("limit", limit.to_string()),
                ],
                false,
            )
            .await?;
        Ok(rows.iter().map(KlineRow::close).collect())
    }

    pub async fn get_balance(&self, asset: &str) -> Result<Decimal, ExchangeError> {
        let account: AccountInfo = self
            .request(Method::GET, "/api/v3/account", &[], true)
            .await?;

        account
            .balances
            .into_iter()
            .find(|b| b.asset == asset)
            .map(|b| b.free)
            .ok_or_else(|| ExchangeError::MissingAsset(asset.to_string()))
    }

    /// Sends a MARKET order tagged with a fresh client order id.
    ///
    /// A transient failure leaves the outcome unknown, so the order is looked
    /// up by its client id before being sent again. It is only resent when
    /// the exchange reports it does not exist.
    pub async fn place_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: f64,
    ) -> Result<OrderResponse, ExchangeError> {
        let client_order_id = Uuid::new_v4().simple().to_string();
        let params = vec![
            ("symbol", symbol.to_string()),
            ("side", side.as_str().to_string()),
            ("type", "MARKET".to_string()),
            ("quantity", format_quantity(quantity)),
            ("newOrderRespType", "FULL".to_string()),
            ("newClientOrderId", client_order_id.clone()),
        ];

        info!(
            %symbol,
            %side,
            quantity = %format_quantity(quantity),
            %client_order_id,
            "🚀 Sending market order"
        );

        let mut attempt = 1;
        loop {
            let err = match self
                .send_once::<OrderResponse>(&Method::POST, "/api/v3/order", &params, true)
                .await
            {
                Ok(order) => return Ok(order),
                Err(e) => e,
            };

            // A rejection on the first attempt is final. After an earlier
            // attempt went missing it may be a duplicate of an order that landed.
            if !err.is_retryable() && attempt == 1 {
                return Err(err);
            }

            match self.query_order(symbol, &client_order_id).await {
                Ok(order) => {
                    info!(%symbol, %client_order_id, "Recovered order after: {}", err);
                    return Ok(order);
                }
                Err(ExchangeError::Api { code, .. })
                    if code == ORDER_NOT_FOUND
                        && err.is_retryable()
                        && attempt < self.max_retries =>
                {
                    warn!(
                        %symbol,
                        attempt,
                        max_attempts = self.max_retries,
                        "Order failed: {}. Not on the exchange, resending in {:?}",
                        err,
                        self.retry_backoff
                    );
                    tokio::time::sleep(self.retry_backoff).await;
                    attempt += 1;
                }
                Err(query_err) => {
                    warn!(%symbol, %client_order_id, "Order lookup failed: {}", query_err);
                    return Err(err);
                }
            }
        }
    }

    pub async fn query_order(
        &self,
        symbol: &str,
        client_order_id: &str,
    ) -> Result<OrderResponse, ExchangeError> {
        self.request(
            Method::GET,
            "/api/v3/order",
            &[
                ("symbol", symbol.to_string()),
                ("origClientOrderId", client_order_id.to_string()),
            ],
            true,
        )
        .await
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    async fn ping(&self) -> Result<(), ExchangeError> {
        let _: serde_json::Value = self.request(Method::GET, "/api/v3/ping", &[], false).await?;
        Ok(())
    }

    async fn current_price(&self, symbol: &str) -> f64 {
        match self.fetch_price(symbol).await {
            Ok(price) => to_f64(price),
            Err(e) => {
                warn!(%symbol, "Failed to fetch price: {}", e);
                0.0
            }
        }
    }

    async fn quote_volume_24h(&self, symbol: &str) -> f64 {
        match self.fetch_quote_volume(symbol).await {
            Ok(volume) => to_f64(volume),
            Err(e) => {
                warn!(%symbol, "Failed to fetch 24h volume: {}", e);
                0.0
            }
        }
    }

    async fn recent_closes(&self, symbol: &str, interval: KlineInterval, limit: u16) -> Vec<f64> {
        match self.fetch_closes(symbol, interval, limit).await {
            Ok(closes) => closes.into_iter().map(to_f64).collect(),
            Err(e) => {
                warn!(%symbol, %interval, "Failed to fetch klines: {}", e);
                Vec::new()
            }
        }
    }

    async fn free_balance(&self, asset: &str) -> f64 {
        match self.get_balance(asset).await {
            Ok(free) => to_f64(free),
            Err(ExchangeError::MissingAsset(_)) => {
                debug!(%asset, "Asset not present in account");
                0.0
            }
            Err(e) => {
                warn!(%asset, "Failed to fetch balance: {}", e);
                0.0
            }
        }
    }

    async fn place_market_order(&self, symbol: &str, side: Side, quantity: f64) -> OrderFill {
        let order = match self.place_order(symbol, side, quantity).await {
            Ok(order) => order,
            Err(ExchangeError::Api { code, message, .. }) => {
                error!(%symbol, %side, code, "⚠️ Order rejected: {}", message);
                return OrderFill::default();
            }
            Err(e) => {
                error!(%symbol, %side, "⚠️ Order failed: {}", e);
                return OrderFill::default();
            }
        };

        match order.average_fill() {
            Some((price, qty)) => {
                info!(
                    %symbol,
                    order_id = order.order_id,
                    status = %order.status,
                    avg_price = %price,
                    filled_qty = %qty,
                    "✅ Order filled"
                );
                OrderFill {
                    average_price: to_f64(price),
                    filled_quantity: to_f64(qty),
                }
            }
            None => {
                warn!(
                    %symbol,
                    order_id = order.order_id,
                    status = %order.status,
                    "Order returned no fills"
                );
                OrderFill::default()
            }
        }
    }
}
