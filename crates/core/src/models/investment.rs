use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

use super::ids::{CompanyId, InvestmentId};

/// A single purchase lot, as stored by the backend.
///
/// Lots are never edited in place: changing a position means deleting its
/// lots and creating a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentRecord {
    pub id: InvestmentId,

    /// Company this lot was bought in
    pub company: CompanyId,

    /// Number of shares bought (must be positive)
    pub stock_unit: i64,

    /// Price per share at purchase time
    pub base_price: f64,

    /// Total paid for the lot (cost basis)
    pub total_price: f64,
}

impl InvestmentRecord {
    pub fn new(
        id: impl Into<InvestmentId>,
        company: impl Into<CompanyId>,
        stock_unit: i64,
        base_price: f64,
        total_price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            company: company.into(),
            stock_unit,
            base_price,
            total_price,
        }
    }

    /// Reject shapes the backend should never have produced.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.stock_unit <= 0 {
            return Err(CoreError::InvalidRecord(format!(
                "investment {} has non-positive stock_unit {}",
                self.id, self.stock_unit
            )));
        }
        if !self.base_price.is_finite() {
            return Err(CoreError::InvalidRecord(format!(
                "investment {} has non-finite base_price",
                self.id
            )));
        }
        if !self.total_price.is_finite() {
            return Err(CoreError::InvalidRecord(format!(
                "investment {} has non-finite total_price",
                self.id
            )));
        }
        Ok(())
    }
}

/// Sum of `stock_unit` over `records`. Fails instead of overflowing.
pub fn sum_units(records: &[InvestmentRecord]) -> Result<i64, CoreError> {
    records.iter().try_fold(0i64, |acc, record| {
        acc.checked_add(record.stock_unit).ok_or_else(|| {
            CoreError::InvalidRecord(format!(
                "total stock units overflow at investment {}",
                record.id
            ))
        })
    })
}

/// Payload for creating a new lot. The backend computes `total_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvestment {
    pub company: CompanyId,
    pub stock_unit: i64,
    pub base_price: f64,
}

impl NewInvestment {
    pub fn new(company: impl Into<CompanyId>, stock_unit: i64, base_price: f64) -> Self {
        Self {
            company: company.into(),
            stock_unit,
            base_price,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.stock_unit <= 0 {
            return Err(CoreError::ValidationError(format!(
                "Stock units must be positive, got {}",
                self.stock_unit
            )));
        }
        if !self.base_price.is_finite() || self.base_price < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Base price must be a finite non-negative number, got {}",
                self.base_price
            )));
        }
        Ok(())
    }
}
