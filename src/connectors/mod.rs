pub mod binance;
pub mod messages;
pub mod paper;
pub mod traits;

pub use binance::BinanceClient;
pub use paper::PaperExchange;
pub use traits::ExchangeClient;
