use thiserror::Error;

/// Unified error type for the entire stock-portfolio-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Backend (stocks / investments) ──────────────────────────────
    #[error("Failed to fetch {resource}: {message}")]
    UpstreamFetch {
        resource: String,
        message: String,
    },

    #[error("Session expired or invalid, please log in again")]
    Unauthorized,

    #[error("No credentials set, log in first")]
    NotAuthenticated,

    #[error("Failed to {operation}: {message}")]
    Mutation {
        operation: String,
        message: String,
    },

    #[error("Invalid investment record: {0}")]
    InvalidRecord(String),

    // ── Quote source ────────────────────────────────────────────────
    #[error("Live price unavailable for {symbol}: {reason}")]
    QuotePriceUnavailable {
        symbol: String,
        reason: String,
    },

    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request to {provider} timed out")]
    Timeout {
        provider: String,
    },

    #[error("No quote provider configured")]
    NoProvider,

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Company not found in portfolio: {0}")]
    CompanyNotFound(String),

    // ── Serialization ───────────────────────────────────────────────
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl CoreError {
    /// Whether the caller should prompt the user to re-authenticate.
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            CoreError::Unauthorized | CoreError::NotAuthenticated | CoreError::UpstreamFetch { .. }
        )
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors often contain full URLs; quote APIs take their keys
        // as query parameters, so strip everything after '?'.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
