// src/connectors/messages.rs
//! Typed REST payloads for the Binance spot API. Decoded once here; the
//! rest of the crate only sees `f64` prices and quantities.
use rust_decimal::Decimal;
use serde::de::IgnoredAny;
use serde::Deserialize;

/// `GET /api/v3/ticker/price`
#[derive(Debug, Deserialize)]
pub struct PriceTicker {
    pub symbol: String,
    pub price: Decimal,
}

/// `GET /api/v3/ticker/24hr` (only the fields we read).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24h {
    pub symbol: String,
    pub quote_volume: Decimal,
}

/// One row of `GET /api/v3/klines`: a 12-element JSON array.
#[derive(Debug, Deserialize)]
pub struct KlineRow(
    pub u64,        // open time
    pub IgnoredAny, // open
    pub IgnoredAny, // high
    pub IgnoredAny, // low
    pub Decimal,    // close
    pub IgnoredAny, // volume
    pub u64,        // close time
    pub IgnoredAny, // quote asset volume
    pub IgnoredAny, // number of trades
    pub IgnoredAny, // taker buy base volume
    pub IgnoredAny, // taker buy quote volume
    pub IgnoredAny, // unused
);

impl KlineRow {
    pub fn close(&self) -> Decimal {
        self.4
    }
}

#[derive(Debug, Deserialize)]
pub struct AccountBalance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

/// `GET /api/v3/account`
#[derive(Debug, Deserialize)]
pub struct AccountInfo {
    pub balances: Vec<AccountBalance>,
}

#[derive(Debug, Deserialize)]
pub struct Fill {
    pub price: Decimal,
    pub qty: Decimal,
}

/// `POST /api/v3/order` with `newOrderRespType=FULL`, or the order status
/// from `GET /api/v3/order`, which carries totals but no `fills`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub symbol: String,
    pub order_id: u64,
    #[serde(default)]
    pub client_order_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub executed_qty: Decimal,
    #[serde(default)]
    pub cummulative_quote_qty: Decimal,
    #[serde(default)]
    pub fills: Vec<Fill>,
}

impl OrderResponse {
    /// Quantity-weighted average price and total quantity of all fills,
    /// falling back to the executed totals when `fills` is absent.
    /// `None` when nothing was filled.
    pub fn average_fill(&self) -> Option<(Decimal, Decimal)> {
        if self.fills.is_empty() {
            if self.executed_qty > Decimal::ZERO && self.cummulative_quote_qty > Decimal::ZERO {
                return Some((self.cummulative_quote_qty / self.executed_qty, self.executed_qty));
            }
            return None;
        }

        let (cost, quantity) = self
            .fills
            .iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(cost, qty), fill| {
                (cost + fill.price * fill.qty, qty + fill.qty)
            });

        if quantity > Decimal::ZERO {
            Some((cost / quantity, quantity))
        } else {
            None
        }
    }
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub code: i64,
    pub msg: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_kline_row_close() {
        let body = r#"[
            [1499040000000, "0.01634790", "0.80000000", "0.01575800", "0.01577100",
             "148976.11427815", 1499644799999, "2434.19055334", 308, "1756.87402397",
             "28.46694368", "0"]
        ]"#;
        let rows: Vec<KlineRow> = serde_json::from_str(body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].close(), Decimal::from_str("0.01577100").unwrap());
    }

    #[test]
    fn test_average_fill_is_quantity_weighted() {
        let body = r#"{
            "symbol": "BTCUSDT",
            "orderId": 28,
            "clientOrderId": "abc",
            "status": "FILLED",
            "fills": [
                {"price": "100.00", "qty": "1.0", "commission": "0", "commissionAsset": "BNB"},
                {"price": "130.00", "qty": "2.0", "commission": "0", "commissionAsset": "BNB"}
            ]
        }"#;
        let order: OrderResponse = serde_json::from_str(body).unwrap();
        let (price, qty) = order.average_fill().unwrap();

        assert_eq!(qty, Decimal::from(3));
        assert_eq!(price, Decimal::from(120));
    }

    #[test]
    fn test_average_fill_without_fills() {
        let body = r#"{"symbol": "BTCUSDT", "orderId": 29, "status": "EXPIRED", "fills": []}"#;
        let order: OrderResponse = serde_json::from_str(body).unwrap();
        assert!(order.average_fill().is_none());
    }

    #[test]
    fn test_average_fill_from_order_status() {
        let body = r#"{
            "symbol": "BTCUSDT",
            "orderId": 30,
            "clientOrderId": "abc",
            "status": "FILLED",
            "origQty": "2.00000000",
            "executedQty": "2.00000000",
            "cummulativeQuoteQty": "100.00000000",
            "type": "MARKET",
            "side": "BUY"
        }"#;
        let order: OrderResponse = serde_json::from_str(body).unwrap();
        let (price, qty) = order.average_fill().unwrap();

        assert_eq!(qty, Decimal::from(2));
        assert_eq!(price, Decimal::from(50));
    }
}
