pub mod cache;
pub mod engine;
pub mod positions;

pub use cache::{MarketDataCache, TimedCache};
pub use engine::TradingEngine;
pub use positions::PositionTracker;
