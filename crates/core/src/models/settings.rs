use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::CoreError;

/// Upper bound for a single quote request, in seconds.
pub const MAX_QUOTE_TIMEOUT_SECS: u64 = 120;

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the portfolio backend (e.g., "https://api.example.com").
    pub api_base_url: String,

    /// Optional API keys for quote providers that require them.
    /// Keys: provider name (e.g., "finnhub", "alphavantage").
    /// Values: the API key string.
    pub api_keys: HashMap<String, String>,

    /// Per-provider timeout for a single live price lookup.
    /// A timed-out lookup is treated as "price unavailable".
    pub quote_timeout_secs: u64,

    /// How many tickers are looked up concurrently.
    pub max_concurrent_quotes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            api_keys: HashMap::new(),
            quote_timeout_secs: 10,
            max_concurrent_quotes: 4,
        }
    }
}

impl Settings {
    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let url = self.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CoreError::ValidationError(format!(
                "Invalid api_base_url '{}': must start with http:// or https://",
                self.api_base_url
            )));
        }
        if self.quote_timeout_secs == 0 || self.quote_timeout_secs > MAX_QUOTE_TIMEOUT_SECS {
            return Err(CoreError::ValidationError(format!(
                "quote_timeout_secs must be between 1 and {MAX_QUOTE_TIMEOUT_SECS}, got {}",
                self.quote_timeout_secs
            )));
        }
        if self.max_concurrent_quotes == 0 {
            return Err(CoreError::ValidationError(
                "max_concurrent_quotes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
