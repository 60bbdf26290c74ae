// src/strategies/traits.rs
use crate::types::IndicatorSnapshot;

/// Signal rules consulted by the engine once the market-data gates pass.
pub trait Strategy: Send + Sync {
    fn name(&self) -> String;

    /// Indicators for the given closes, or `None` when there are too few
    /// candles to trust them.
    fn evaluate(&self, closes: &[f64]) -> Option<IndicatorSnapshot>;

    fn should_enter(&self, snapshot: &IndicatorSnapshot) -> bool;

    fn should_exit(&self, snapshot: &IndicatorSnapshot) -> bool;
}
