use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::company::Company;
use crate::models::ids::InvestmentId;
use crate::models::investment::{InvestmentRecord, NewInvestment};

/// Bearer token for the portfolio backend.
///
/// Obtaining and storing the token is the caller's business; the core only
/// attaches it to requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// The portfolio backend: company reference data plus the user's lots.
///
/// Reads fail with [`CoreError::UpstreamFetch`] (or
/// [`CoreError::InvalidRecord`] for malformed payloads), writes with
/// [`CoreError::Mutation`]; an expired session is
/// [`CoreError::Unauthorized`] either way. Nothing is retried here.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PortfolioBackend: Send + Sync {
    /// `GET /stocks`
    async fn list_stocks(&self, credentials: &Credentials) -> Result<Vec<Company>, CoreError>;

    /// `GET /investments`
    async fn list_investments(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<InvestmentRecord>, CoreError>;

    /// `POST /investments`
    async fn create_investment(
        &self,
        credentials: &Credentials,
        investment: &NewInvestment,
    ) -> Result<InvestmentRecord, CoreError>;

    /// `DELETE /investments/{id}`
    async fn delete_investment(
        &self,
        credentials: &Credentials,
        id: &InvestmentId,
    ) -> Result<(), CoreError>;
}
