use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CompanyId, InvestmentId};

/// Headline figures over the whole investment list.
///
/// `total_price` is the **cost basis** (what was paid). The live market
/// value lives in [`Valuation::total`]; the two are never conflated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Sum of every lot's `total_price`
    pub total_price: f64,

    /// Number of distinct companies with at least one lot
    pub total_companies: usize,

    /// Sum of every lot's `stock_unit`
    pub total_stocks: i64,
}

/// Where a lot's unit price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceSource {
    /// Live quote for the company's ticker
    Live,
    /// The lot's own purchase price (quote unavailable or not yet loaded)
    BasePrice,
}

/// Current value of a single lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordValue {
    pub investment_id: InvestmentId,
    pub company_id: CompanyId,
    pub unit_price: f64,
    pub source: PriceSource,
    /// `unit_price * stock_unit`
    pub current_value: f64,
}

/// Current value of one company's position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyValue {
    pub company_id: CompanyId,
    pub value: f64,
}

/// Live valuation of one investment set.
///
/// Produced in a single pass over a complete batch of live prices, so a
/// finished valuation never shows a partial total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    /// Generation of the investment set this valuation belongs to
    pub generation: u64,

    /// One entry per lot, in grouped order
    pub per_record_value: Vec<RecordValue>,

    /// One entry per company, in grouped order
    pub per_company_value: Vec<CompanyValue>,

    /// Live portfolio value (sum over companies)
    pub total: f64,

    /// True if some referenced ticker has not been resolved yet
    pub still_loading: bool,

    /// When this valuation was computed
    pub as_of: DateTime<Utc>,
}

impl Valuation {
    /// Live value of a single company, if it is part of this valuation.
    #[must_use]
    pub fn company_value(&self, company: &CompanyId) -> Option<f64> {
        self.per_company_value
            .iter()
            .find(|c| &c.company_id == company)
            .map(|c| c.value)
    }

    /// Live value of a single lot.
    #[must_use]
    pub fn record_value(&self, investment: &InvestmentId) -> Option<f64> {
        self.per_record_value
            .iter()
            .find(|r| &r.investment_id == investment)
            .map(|r| r.current_value)
    }
}
