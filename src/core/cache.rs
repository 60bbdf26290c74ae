// src/core/cache.rs
use crate::connectors::traits::ExchangeClient;
use crate::types::KlineInterval;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    fetched_at: i64,
}

/// Map of last-fetched values with a freshness window checked on read.
///
/// One lock guards the whole map and stays held while a stale entry is
/// refetched, so refreshes are serialised and a value is never stored
/// without its timestamp.
pub struct TimedCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> Default for TimedCache<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> TimedCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value if `now - fetched_at < window`, otherwise the result of
    /// `fetch`, which is stored with `fetched_at = now` whatever it is.
    /// Failed fetches come back as zero/empty values and are cached too.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, now: i64, window: i64, fetch: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get(&key) {
            if now - entry.fetched_at < window {
                return entry.value.clone();
            }
        }

        let value = fetch().await;
        entries.insert(
            key,
            CacheEntry {
                value: value.clone(),
                fetched_at: now,
            },
        );
        value
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClosesKey {
    symbol: String,
    interval: KlineInterval,
    limit: u16,
}

/// Market data shared by every symbol's evaluation.
///
/// 24h volume and candle closes are cached for `refresh_interval` seconds.
/// The current price is always fetched fresh: orders are priced from it.
pub struct MarketDataCache {
    refresh_interval: i64,
    volumes: TimedCache<String, f64>,
    closes: TimedCache<ClosesKey, Vec<f64>>,
}

impl MarketDataCache {
    pub fn new(refresh_interval_secs: i64) -> Self {
        Self {
            refresh_interval: refresh_interval_secs,
            volumes: TimedCache::new(),
            closes: TimedCache::new(),
        }
    }

    pub async fn quote_volume_24h<C>(&self, client: &C, symbol: &str, now: i64) -> f64
    where
        C: ExchangeClient + ?Sized,
    {
        self.volumes
            .get_or_fetch(symbol.to_string(), now, self.refresh_interval, move || async move {
                debug!(%symbol, "Refreshing 24h volume");
                client.quote_volume_24h(symbol).await
            })
            .await
    }

    pub async fn recent_closes<C>(
        &self,
        client: &C,
        symbol: &str,
        interval: KlineInterval,
        limit: u16,
        now: i64,
    ) -> Vec<f64>
    where
        C: ExchangeClient + ?Sized,
    {
        let key = ClosesKey {
            symbol: symbol.to_string(),
            interval,
            limit,
        };
        self.closes
            .get_or_fetch(key, now, self.refresh_interval, move || async move {
                debug!(%symbol, %interval, limit, "Refreshing klines");
                client.recent_closes(symbol, interval, limit).await
            })
            .await
    }

    /// Not cached.
    pub async fn current_price<C>(&self, client: &C, symbol: &str) -> f64
    where
        C: ExchangeClient + ?Sized,
    {
        client.current_price(symbol).await
    }

    pub async fn volume_entries(&self) -> usize {
        self.volumes.len().await
    }

    pub async fn closes_entries(&self) -> usize {
        self.closes.len().await
    }
}
