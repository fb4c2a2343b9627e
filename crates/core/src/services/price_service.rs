use chrono::Utc;
use futures::future::join_all;
use log::{debug, warn};
use std::collections::HashSet;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::analytics::Valuation;
use crate::models::company::CompanyLookup;
use crate::models::portfolio::GroupedInvestments;
use crate::models::price::LivePrices;
use crate::models::settings::Settings;
use crate::providers::registry::QuoteProviderRegistry;
use crate::providers::traits::QuoteProvider;
use crate::services::valuation_service::ValuationService;

/// Fetches live prices from quote providers.
///
/// - Providers are tried in registration order; a failure, timeout or
///   invalid price falls through to the next one.
/// - A batch resolves every ticker before returning. Per-ticker failures
///   are absorbed as "unavailable" and never surface to the caller.
pub struct PriceService {
    registry: QuoteProviderRegistry,
    valuation_service: ValuationService,
    quote_timeout: Duration,
    max_concurrent_quotes: usize,
}

impl PriceService {
    /// Service with the default timeout and concurrency from [`Settings`].
    pub fn new(registry: QuoteProviderRegistry) -> Self {
        let defaults = Settings::default();
        Self::with_limits(
            registry,
            Duration::from_secs(defaults.quote_timeout_secs),
            defaults.max_concurrent_quotes,
        )
    }

    pub fn with_limits(
        registry: QuoteProviderRegistry,
        quote_timeout: Duration,
        max_concurrent_quotes: usize,
    ) -> Self {
        Self {
            registry,
            valuation_service: ValuationService::new(),
            quote_timeout,
            max_concurrent_quotes: max_concurrent_quotes.max(1),
        }
    }

    /// Service with the default provider set for the configured API keys.
    pub fn from_settings(settings: &Settings) -> Self {
        let registry = QuoteProviderRegistry::new_with_defaults(&settings.api_keys);
        Self::with_limits(
            registry,
            Duration::from_secs(settings.quote_timeout_secs),
            settings.max_concurrent_quotes,
        )
    }

    /// Check if at least one quote provider is registered.
    pub fn has_provider(&self) -> bool {
        !self.registry.is_empty()
    }

    /// Names of the registered providers, in priority order.
    pub fn get_provider_names(&self) -> Vec<String> {
        self.registry.provider_names()
    }

    /// Current price of one ticker, with provider fallback.
    ///
    /// Rejects prices that are not finite or not strictly positive; a zero
    /// close usually means a delisted or unknown ticker.
    pub async fn get_price(&self, symbol: &str) -> Result<f64, CoreError> {
        let providers = self.registry.providers();
        if providers.is_empty() {
            return Err(CoreError::NoProvider);
        }

        let mut last_error = None;
        for provider in providers {
            match self.query_provider(provider, symbol).await {
                Ok(price) => {
                    if !price.is_finite() || price <= 0.0 {
                        last_error = Some(CoreError::Api {
                            provider: provider.name().to_string(),
                            message: format!(
                                "Invalid price returned for {symbol}: {price} (must be finite and positive)"
                            ),
                        });
                        continue;
                    }
                    return Ok(price);
                }
                Err(e) => {
                    debug!("{} failed for {symbol}: {e}", provider.name());
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(CoreError::NoProvider))
    }

    /// Resolve a batch of tickers. Every input symbol (uppercased, deduped)
    /// gets an entry, either a price or "unavailable".
    pub async fn resolve_live_prices(&self, symbols: &[String]) -> LivePrices {
        let mut seen = HashSet::new();
        let unique: Vec<String> = symbols
            .iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .collect();

        let mut live_prices = LivePrices::new();
        let mut unavailable = 0usize;

        for chunk in unique.chunks(self.max_concurrent_quotes) {
            let futures: Vec<_> = chunk
                .iter()
                .map(|symbol| async move { (symbol, self.get_price(symbol).await) })
                .collect();

            for (symbol, result) in join_all(futures).await {
                match result {
                    Ok(price) => live_prices.set_available(symbol, price),
                    Err(e) => {
                        let absorbed = CoreError::QuotePriceUnavailable {
                            symbol: symbol.clone(),
                            reason: e.to_string(),
                        };
                        warn!("{absorbed}; falling back to base price");
                        live_prices.set_unavailable(symbol);
                        unavailable += 1;
                    }
                }
            }
        }

        live_prices.fetched_at = Some(Utc::now());
        debug!(
            "Resolved {} live prices ({} unavailable)",
            unique.len(),
            unavailable
        );
        live_prices
    }

    /// Look up every ticker the grouped lots reference and value the
    /// portfolio against the complete batch.
    ///
    /// The returned valuation is always complete (`still_loading == false`).
    pub async fn reconcile_live_prices(
        &self,
        grouped: &GroupedInvestments,
        lookup: &CompanyLookup,
        generation: u64,
    ) -> Valuation {
        let symbols = self.valuation_service.referenced_symbols(grouped, lookup);
        let live_prices = self.resolve_live_prices(&symbols).await;
        self.valuation_service
            .value_portfolio(grouped, lookup, &live_prices, generation)
    }

    async fn query_provider(
        &self,
        provider: &dyn QuoteProvider,
        symbol: &str,
    ) -> Result<f64, CoreError> {
        #[cfg(not(target_arch = "wasm32"))]
        {
            match tokio::time::timeout(self.quote_timeout, provider.get_current_price(symbol)).await
            {
                Ok(result) => result,
                Err(_) => Err(CoreError::Timeout {
                    provider: provider.name().to_string(),
                }),
            }
        }
        #[cfg(target_arch = "wasm32")]
        {
            provider.get_current_price(symbol).await
        }
    }
}
