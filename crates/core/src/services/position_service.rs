use futures::future::join_all;
use log::{debug, warn};

use crate::backend::traits::{Credentials, PortfolioBackend};
use crate::errors::CoreError;
use crate::models::ids::CompanyId;
use crate::models::investment::{InvestmentRecord, NewInvestment};
use crate::models::portfolio::GroupedInvestments;

/// Mutations against the backend: add a lot, replace a company's position,
/// or remove it.
///
/// The backend has no multi-record transaction, so a position edit is
/// "delete every lot, then create one". The create is only issued once
/// every delete has succeeded. Callers must re-fetch afterwards, whatever
/// the outcome.
pub struct PositionService;

impl PositionService {
    pub fn new() -> Self {
        Self
    }

    /// Create a single new lot.
    pub async fn add_investment(
        &self,
        backend: &dyn PortfolioBackend,
        credentials: &Credentials,
        investment: &NewInvestment,
    ) -> Result<InvestmentRecord, CoreError> {
        investment.validate()?;
        debug!(
            "Adding {} units of company {} at {}",
            investment.stock_unit, investment.company, investment.base_price
        );
        backend.create_investment(credentials, investment).await
    }

    /// Replace every lot of `company` with one lot of `stock_unit` shares
    /// at `base_price`.
    ///
    /// If any delete fails, no create is issued and the whole edit fails.
    pub async fn edit_position(
        &self,
        backend: &dyn PortfolioBackend,
        credentials: &Credentials,
        grouped: &GroupedInvestments,
        company: &CompanyId,
        stock_unit: i64,
        base_price: f64,
    ) -> Result<InvestmentRecord, CoreError> {
        let replacement = NewInvestment::new(company.clone(), stock_unit, base_price);
        replacement.validate()?;

        let group = grouped
            .get(company)
            .ok_or_else(|| CoreError::CompanyNotFound(company.to_string()))?;

        self.delete_lots(backend, credentials, company, &group.investments)
            .await?;

        debug!("All lots of company {company} deleted; creating replacement lot");
        backend.create_investment(credentials, &replacement).await
    }

    /// Delete every lot of `company`. Returns the number of lots removed.
    pub async fn delete_position(
        &self,
        backend: &dyn PortfolioBackend,
        credentials: &Credentials,
        grouped: &GroupedInvestments,
        company: &CompanyId,
    ) -> Result<usize, CoreError> {
        let group = grouped
            .get(company)
            .ok_or_else(|| CoreError::CompanyNotFound(company.to_string()))?;

        self.delete_lots(backend, credentials, company, &group.investments)
            .await?;
        Ok(group.investments.len())
    }

    /// Issue all deletes, wait for every one of them, then report.
    async fn delete_lots(
        &self,
        backend: &dyn PortfolioBackend,
        credentials: &Credentials,
        company: &CompanyId,
        lots: &[InvestmentRecord],
    ) -> Result<(), CoreError> {
        let futures: Vec<_> = lots
            .iter()
            .map(|lot| async move { (lot, backend.delete_investment(credentials, &lot.id).await) })
            .collect();

        let mut failures = Vec::new();
        let mut unauthorized = false;
        for (lot, result) in join_all(futures).await {
            if let Err(e) = result {
                warn!("Failed to delete investment {} of company {company}: {e}", lot.id);
                unauthorized |= matches!(e, CoreError::Unauthorized);
                failures.push(format!("{}: {e}", lot.id));
            }
        }

        if unauthorized {
            return Err(CoreError::Unauthorized);
        }
        if !failures.is_empty() {
            return Err(CoreError::Mutation {
                operation: format!(
                    "delete {} of {} lots in company {company}",
                    failures.len(),
                    lots.len()
                ),
                message: failures.join("; "),
            });
        }
        Ok(())
    }
}

impl Default for PositionService {
    fn default() -> Self {
        Self::new()
    }
}
