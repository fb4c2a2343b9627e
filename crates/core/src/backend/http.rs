use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::company::Company;
use crate::models::ids::InvestmentId;
use crate::models::investment::{InvestmentRecord, NewInvestment};
use super::traits::{Credentials, PortfolioBackend};

/// Longest error body echoed back in an error message.
const MAX_ERROR_BODY: usize = 200;

/// JSON-over-HTTP client for the portfolio backend.
///
/// Every request carries `Authorization: Bearer <token>` and
/// `Content-Type: application/json`.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self, CoreError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(CoreError::ValidationError(format!(
                "Invalid backend URL '{base_url}': must start with http:// or https://"
            )));
        }

        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Ok(Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: trimmed.to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        credentials: &Credentials,
        resource: &str,
        path: &str,
    ) -> Result<Vec<T>, CoreError> {
        debug!("GET {path}");
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(credentials.token())
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| CoreError::UpstreamFetch {
                resource: resource.to_string(),
                message: CoreError::from(e).to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| CoreError::UpstreamFetch {
            resource: resource.to_string(),
            message: CoreError::from(e).to_string(),
        })?;

        check_read_status(resource, status, &body)?;
        parse_list(resource, &body)
    }
}

// ── Response handling ───────────────────────────────────────────────

/// List endpoints answer either with a bare array or with a paginated
/// `{ "results": [...] }` envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListResponse<T> {
    Plain(Vec<T>),
    Paginated { results: Vec<T> },
}

/// Decode a list payload. A payload that doesn't match the record shape
/// is rejected as a whole rather than partially accepted.
pub fn parse_list<T: DeserializeOwned>(resource: &str, body: &str) -> Result<Vec<T>, CoreError> {
    let parsed: ListResponse<T> = serde_json::from_str(body).map_err(|e| {
        CoreError::InvalidRecord(format!("malformed {resource} payload: {e}"))
    })?;
    Ok(match parsed {
        ListResponse::Plain(items) => items,
        ListResponse::Paginated { results } => results,
    })
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() > MAX_ERROR_BODY {
        let cut: String = trimmed.chars().take(MAX_ERROR_BODY).collect();
        format!("{cut}…")
    } else {
        trimmed.to_string()
    }
}

/// Map the status of a read request onto the error taxonomy.
pub fn check_read_status(resource: &str, status: StatusCode, body: &str) -> Result<(), CoreError> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(CoreError::Unauthorized);
    }
    if !status.is_success() {
        return Err(CoreError::UpstreamFetch {
            resource: resource.to_string(),
            message: format!("HTTP {status}: {}", truncate_body(body)),
        });
    }
    Ok(())
}

/// Map the status of a create/delete request onto the error taxonomy.
pub fn check_write_status(operation: &str, status: StatusCode, body: &str) -> Result<(), CoreError> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(CoreError::Unauthorized);
    }
    if !status.is_success() {
        return Err(CoreError::Mutation {
            operation: operation.to_string(),
            message: format!("HTTP {status}: {}", truncate_body(body)),
        });
    }
    Ok(())
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PortfolioBackend for HttpBackend {
    async fn list_stocks(&self, credentials: &Credentials) -> Result<Vec<Company>, CoreError> {
        self.get_list(credentials, "stocks", "/stocks").await
    }

    async fn list_investments(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<InvestmentRecord>, CoreError> {
        self.get_list(credentials, "investments", "/investments").await
    }

    async fn create_investment(
        &self,
        credentials: &Credentials,
        investment: &NewInvestment,
    ) -> Result<InvestmentRecord, CoreError> {
        let operation = format!("create investment in company {}", investment.company);
        let mutation_err = |message: String| CoreError::Mutation {
            operation: operation.clone(),
            message,
        };

        debug!("POST /investments (company {})", investment.company);
        let response = self
            .client
            .post(self.url("/investments"))
            .bearer_auth(credentials.token())
            .json(investment)
            .send()
            .await
            .map_err(|e| mutation_err(CoreError::from(e).to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| mutation_err(CoreError::from(e).to_string()))?;

        check_write_status(&operation, status, &body)?;
        serde_json::from_str(&body)
            .map_err(|e| CoreError::InvalidRecord(format!("malformed created investment: {e}")))
    }

    async fn delete_investment(
        &self,
        credentials: &Credentials,
        id: &InvestmentId,
    ) -> Result<(), CoreError> {
        let operation = format!("delete investment {id}");

        debug!("DELETE /investments/{id}");
        let response = self
            .client
            .delete(self.url(&format!("/investments/{id}")))
            .bearer_auth(credentials.token())
            .send()
            .await
            .map_err(|e| CoreError::Mutation {
                operation: operation.clone(),
                message: CoreError::from(e).to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        check_write_status(&operation, status, &body)
    }
}
