// src/core/positions.rs
use crate::types::Position;
use std::collections::HashMap;
use tracing::warn;

/// One [`Position`] per configured symbol, flat at start-up.
///
/// Only the engine mutates it, and only after a confirmed non-zero fill.
#[derive(Debug, Default)]
pub struct PositionTracker {
    positions: HashMap<String, Position>,
}

impl PositionTracker {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let positions = symbols
            .into_iter()
            .map(|s| (s.as_ref().to_string(), Position::flat(s.as_ref())))
            .collect();
        Self { positions }
    }

    pub fn get(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn open_position(
        &mut self,
        symbol: &str,
        fill_price: f64,
        filled_qty: f64,
        timestamp: i64,
    ) {
        match self.positions.get_mut(symbol) {
            Some(pos) => {
                pos.in_position = true;
                pos.entry_price = fill_price;
                pos.quantity = filled_qty;
                pos.last_entry_timestamp = timestamp;
            }
            None => warn!(%symbol, "open_position on an untracked symbol"),
        }
    }

    /// Back to flat. The entry timestamp is kept: the cooldown counts from
    /// the last buy, not the last sell.
    pub fn close_position(&mut self, symbol: &str) {
        match self.positions.get_mut(symbol) {
            Some(pos) => {
                pos.in_position = false;
                pos.entry_price = 0.0;
                pos.quantity = 0.0;
            }
            None => warn!(%symbol, "close_position on an untracked symbol"),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }
}
