use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

use super::analytics::{PortfolioSummary, Valuation};
use super::chart::{CompanyColors, DistributionDatum};
use super::ids::CompanyId;
use super::investment::{sum_units, InvestmentRecord};

/// All lots held in one company, in the order the backend returned them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentGroup {
    pub company: CompanyId,
    pub investments: Vec<InvestmentRecord>,
}

impl InvestmentGroup {
    /// Total shares held across the group's lots.
    pub fn total_units(&self) -> Result<i64, CoreError> {
        sum_units(&self.investments)
    }

    /// Total cost basis of the group's lots.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.investments.iter().map(|i| i.total_price).sum()
    }
}

/// Lots grouped by company.
///
/// Groups are ordered by the first appearance of their company in the
/// input; a company never has an empty group. Every record belongs to
/// exactly one group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupedInvestments {
    groups: Vec<InvestmentGroup>,
}

impl GroupedInvestments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to its company's group, opening a new group at the
    /// end if the company has not been seen yet.
    pub fn push(&mut self, record: InvestmentRecord) {
        match self.groups.iter_mut().find(|g| g.company == record.company) {
            Some(group) => group.investments.push(record),
            None => self.groups.push(InvestmentGroup {
                company: record.company.clone(),
                investments: vec![record],
            }),
        }
    }

    #[must_use]
    pub fn get(&self, company: &CompanyId) -> Option<&InvestmentGroup> {
        self.groups.iter().find(|g| &g.company == company)
    }

    #[must_use]
    pub fn contains(&self, company: &CompanyId) -> bool {
        self.get(company).is_some()
    }

    /// Drop a company's group entirely. Returns the removed group, if any.
    pub fn remove(&mut self, company: &CompanyId) -> Option<InvestmentGroup> {
        let idx = self.groups.iter().position(|g| &g.company == company)?;
        Some(self.groups.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &InvestmentGroup> {
        self.groups.iter()
    }

    /// Company ids in group order.
    pub fn company_ids(&self) -> impl Iterator<Item = &CompanyId> {
        self.groups.iter().map(|g| &g.company)
    }

    /// Number of companies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of lots across all groups.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.groups.iter().map(|g| g.investments.len()).sum()
    }
}

/// Everything the dashboard renders for one state of the portfolio.
///
/// Recomputed from scratch whenever the investment list or the live
/// valuation changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    /// Investment-set generation this snapshot was computed for
    pub generation: u64,

    pub grouped: GroupedInvestments,

    pub summary: PortfolioSummary,

    /// Units held per company
    pub stock_distribution: Vec<DistributionDatum>,

    /// Live value per company (empty until the valuation completes)
    pub value_distribution: Vec<DistributionDatum>,

    pub company_colors: CompanyColors,

    /// Live portfolio value, once every symbol has resolved
    pub live_value: Option<f64>,

    /// True while live prices for this investment set are still loading
    pub calculating_value: bool,

    /// Valuation behind the value figures (base prices while loading)
    pub valuation: Valuation,
}

impl PortfolioSnapshot {
    /// The headline "total value": live value once it is known, otherwise
    /// the cost basis.
    #[must_use]
    pub fn display_total(&self) -> f64 {
        self.live_value.unwrap_or(self.summary.total_price)
    }

    /// Current live value for a single company, if known.
    #[must_use]
    pub fn company_value(&self, company: &CompanyId) -> Option<f64> {
        self.value_distribution
            .iter()
            .find(|d| &d.company_id == company)
            .map(|d| d.value)
    }

    /// Serialize for handing over to a JavaScript frontend.
    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string(self)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize snapshot: {e}")))
    }
}
