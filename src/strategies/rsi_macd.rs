use crate::config::TradingConfig;
use crate::indicators::{macd, rsi};
use crate::strategies::traits::Strategy;
use crate::types::IndicatorSnapshot;

/// Buys oversold dips with bullish MACD momentum, sells overbought
/// stretches once momentum turns bearish.
#[derive(Debug, Clone)]
pub struct RsiMacdStrategy {
    rsi_period: usize,
    buy_rsi_threshold: f64,
    sell_rsi_threshold: f64,
    macd_short: usize,
    macd_long: usize,
    macd_signal: usize,
}

impl RsiMacdStrategy {
    pub fn new(config: &TradingConfig) -> Self {
        Self {
            rsi_period: config.rsi_period,
            buy_rsi_threshold: config.buy_rsi_threshold,
            sell_rsi_threshold: config.sell_rsi_threshold,
            macd_short: config.macd_short_window,
            macd_long: config.macd_long_window,
            macd_signal: config.macd_signal_window,
        }
    }
}

impl Strategy for RsiMacdStrategy {
    fn name(&self) -> String {
        format!(
            "RSI({})+MACD({},{},{})",
            self.rsi_period, self.macd_short, self.macd_long, self.macd_signal
        )
    }

    fn evaluate(&self, closes: &[f64]) -> Option<IndicatorSnapshot> {
        if closes.len() < self.macd_long {
            return None;
        }
        let m = macd(closes, self.macd_short, self.macd_long, self.macd_signal);
        Some(IndicatorSnapshot {
            rsi: rsi(closes, self.rsi_period),
            macd: m.macd,
            signal: m.signal,
            histogram: m.histogram,
        })
    }

    fn should_enter(&self, snapshot: &IndicatorSnapshot) -> bool {
        snapshot.rsi <= self.buy_rsi_threshold && snapshot.histogram > 0.0
    }

    fn should_exit(&self, snapshot: &IndicatorSnapshot) -> bool {
        snapshot.rsi >= self.sell_rsi_threshold && snapshot.histogram < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy() -> RsiMacdStrategy {
        RsiMacdStrategy::new(&TradingConfig::default())
    }

    fn snapshot(rsi: f64, histogram: f64) -> IndicatorSnapshot {
        IndicatorSnapshot {
            rsi,
            histogram,
            ..IndicatorSnapshot::default()
        }
    }

    #[test]
    fn test_entry_needs_oversold_and_bullish() {
        let s = strategy();
        assert!(s.should_enter(&snapshot(30.0, 0.1)));
        assert!(!s.should_enter(&snapshot(30.1, 0.1)));
        assert!(!s.should_enter(&snapshot(20.0, 0.0)));
        assert!(!s.should_enter(&snapshot(20.0, -0.1)));
    }

    #[test]
    fn test_exit_needs_overbought_and_bearish() {
        let s = strategy();
        assert!(s.should_exit(&snapshot(70.0, -0.1)));
        assert!(!s.should_exit(&snapshot(69.9, -0.1)));
        assert!(!s.should_exit(&snapshot(80.0, 0.0)));
    }

    #[test]
    fn test_too_few_candles() {
        let s = strategy();
        assert!(s.evaluate(&[100.0; 25]).is_none());
        assert!(s.evaluate(&[100.0; 26]).is_some());
    }

    #[test]
    fn test_decelerating_selloff_is_a_buy() {
        // Steep decline that slows down: every recent candle is red
        // (RSI 0) while MACD climbs back toward zero.
        let closes: Vec<f64> = (0..50)
            .map(|i| {
                if i < 30 {
                    1000.0 - 10.0 * i as f64
                } else {
                    710.0 - (i - 29) as f64
                }
            })
            .collect();

        let s = strategy();
        let snap = s.evaluate(&closes).unwrap();
        assert_eq!(snap.rsi, 0.0);
        assert!(snap.histogram > 0.0, "{:?}", snap);
        assert!(s.should_enter(&snap));
    }

    #[test]
    fn test_stalling_rally_is_a_sell() {
        let closes: Vec<f64> = (0..50)
            .map(|i| {
                if i < 30 {
                    100.0 + 10.0 * i as f64
                } else {
                    390.0 + (i - 29) as f64
                }
            })
            .collect();

        let s = strategy();
        let snap = s.evaluate(&closes).unwrap();
        assert_eq!(snap.rsi, 100.0);
        assert!(snap.histogram < 0.0, "{:?}", snap);
        assert!(s.should_exit(&snap));
    }
}
