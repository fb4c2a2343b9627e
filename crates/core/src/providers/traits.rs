use async_trait::async_trait;

use crate::errors::CoreError;

/// Trait abstraction for live quote sources.
///
/// Implemented by Yahoo Finance, Finnhub and Alpha Vantage.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait QuoteProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Latest unit price for a ticker symbol (e.g., "AAPL").
    async fn get_current_price(&self, symbol: &str) -> Result<f64, CoreError>;
}
