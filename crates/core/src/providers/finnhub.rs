use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use super::traits::QuoteProvider;

const BASE_URL: &str = "https://finnhub.io/api/v1";
const PROVIDER: &str = "Finnhub";

/// Finnhub quote provider.
///
/// - **Free tier**: 60 calls/minute.
/// - **Requires**: API key (set via settings as "finnhub"), sent as a
///   header rather than a query parameter.
/// - **Endpoint**: `/quote?symbol={symbol}`
pub struct FinnhubProvider {
    client: Client,
    api_key: String,
}

impl FinnhubProvider {
    pub fn new(api_key: String) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            api_key,
        }
    }
}

// ── Finnhub API response types ──────────────────────────────────────

#[derive(Deserialize)]
struct QuoteResponse {
    /// Current price
    c: Option<f64>,
}

/// Extract the current price from a `/quote` payload.
///
/// Finnhub answers unknown symbols with a 200 and an all-zero body, so a
/// zero price counts as "no data".
pub fn parse_quote(symbol: &str, body: &str) -> Result<f64, CoreError> {
    let resp: QuoteResponse = serde_json::from_str(body).map_err(|e| CoreError::Api {
        provider: PROVIDER.into(),
        message: format!("Failed to parse quote for {symbol}: {e}"),
    })?;

    match resp.c {
        Some(price) if price > 0.0 => Ok(price),
        _ => Err(CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("No quote data for {symbol}"),
        }),
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl QuoteProvider for FinnhubProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_current_price(&self, symbol: &str) -> Result<f64, CoreError> {
        let upper = symbol.to_uppercase();
        debug!("Fetching latest quote for {upper} from Finnhub");

        let response = self
            .client
            .get(format!("{BASE_URL}/quote"))
            .header("X-Finnhub-Token", &self.api_key)
            .query(&[("symbol", upper.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::FORBIDDEN {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Rate limited while fetching {upper}"),
            });
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: "Invalid or missing API key".into(),
            });
        }
        if !status.is_success() {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("HTTP {status} for {upper}"),
            });
        }

        let body = response.text().await?;
        parse_quote(&upper, &body)
    }
}
