pub mod registry;
pub mod traits;

// Quote API implementations
pub mod alphavantage;
pub mod finnhub;
#[cfg(not(target_arch = "wasm32"))]
pub mod yahoo_finance;
