// Technical indicators used by the trading rules.
// Pure functions over close-price slices, oldest first.

pub mod ema;
pub mod macd;
pub mod rsi;

pub use ema::ema;
pub use macd::{macd, MacdOutput};
pub use rsi::{rsi, NEUTRAL_RSI};
