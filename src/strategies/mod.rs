pub mod rsi_macd;
pub mod traits;

pub use rsi_macd::RsiMacdStrategy;
pub use traits::Strategy;
