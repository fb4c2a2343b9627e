use std::collections::HashSet;

use crate::errors::CoreError;
use crate::models::analytics::{PortfolioSummary, Valuation};
use crate::models::chart::DistributionDatum;
use crate::models::company::{Company, CompanyLookup};
use crate::models::investment::{sum_units, InvestmentRecord};
use crate::models::portfolio::{GroupedInvestments, PortfolioSnapshot};
use crate::models::price::LivePrices;
use crate::services::chart_service::ChartService;
use crate::services::valuation_service::ValuationService;

/// Turns raw lots, companies and live prices into a [`PortfolioSnapshot`].
///
/// Pure business logic, no I/O. Everything is recomputed from scratch on
/// each call; nothing is updated incrementally.
pub struct AggregationService {
    valuation_service: ValuationService,
    chart_service: ChartService,
}

impl AggregationService {
    pub fn new() -> Self {
        Self {
            valuation_service: ValuationService::new(),
            chart_service: ChartService::new(),
        }
    }

    /// Group lots by company, validating each one on the way in.
    ///
    /// Groups follow the first appearance of their company; lots keep
    /// their input order within a group.
    pub fn group_investments(
        &self,
        investments: &[InvestmentRecord],
    ) -> Result<GroupedInvestments, CoreError> {
        let mut grouped = GroupedInvestments::new();
        for record in investments {
            record.validate()?;
            grouped.push(record.clone());
        }
        Ok(grouped)
    }

    /// Cost-basis totals over the whole list.
    pub fn summarize(
        &self,
        investments: &[InvestmentRecord],
    ) -> Result<PortfolioSummary, CoreError> {
        let total_price = investments.iter().map(|i| i.total_price).sum();
        let total_stocks = sum_units(investments)?;
        let total_companies = investments
            .iter()
            .map(|i| &i.company)
            .collect::<HashSet<_>>()
            .len();

        Ok(PortfolioSummary {
            total_price,
            total_companies,
            total_stocks,
        })
    }

    /// Units held per company, in group order.
    pub fn stock_distribution(
        &self,
        grouped: &GroupedInvestments,
        lookup: &CompanyLookup,
    ) -> Result<Vec<DistributionDatum>, CoreError> {
        grouped
            .iter()
            .map(|g| {
                Ok(DistributionDatum {
                    company_id: g.company.clone(),
                    name: lookup.name_of(&g.company),
                    value: g.total_units()? as f64,
                })
            })
            .collect()
    }

    /// Live value per company, in group order. Empty while the valuation
    /// is still loading: a partial total is never shown as final.
    pub fn value_distribution(
        &self,
        valuation: &Valuation,
        grouped: &GroupedInvestments,
        lookup: &CompanyLookup,
    ) -> Vec<DistributionDatum> {
        if valuation.still_loading {
            return Vec::new();
        }
        grouped
            .company_ids()
            .filter_map(|id| {
                valuation.company_value(id).map(|value| DistributionDatum {
                    company_id: id.clone(),
                    name: lookup.name_of(id),
                    value,
                })
            })
            .collect()
    }

    /// Build the full snapshot against a batch of live prices.
    ///
    /// Tickers missing from `live_prices` keep the snapshot in the
    /// "calculating" state.
    pub fn aggregate(
        &self,
        investments: &[InvestmentRecord],
        stocks: &[Company],
        live_prices: &LivePrices,
        generation: u64,
    ) -> Result<PortfolioSnapshot, CoreError> {
        let grouped = self.group_investments(investments)?;
        let lookup = CompanyLookup::new(stocks);
        let valuation = self
            .valuation_service
            .value_portfolio(&grouped, &lookup, live_prices, generation);
        self.assemble(investments, grouped, &lookup, valuation, generation)
    }

    /// Build the full snapshot against an already computed valuation.
    ///
    /// A valuation from another generation is ignored and the snapshot
    /// falls back to the pending (base price, loading) state.
    pub fn aggregate_with_valuation(
        &self,
        investments: &[InvestmentRecord],
        stocks: &[Company],
        valuation: Option<&Valuation>,
        generation: u64,
    ) -> Result<PortfolioSnapshot, CoreError> {
        let grouped = self.group_investments(investments)?;
        let lookup = CompanyLookup::new(stocks);
        let valuation = match valuation {
            Some(v) if v.generation == generation => v.clone(),
            _ => self.valuation_service.pending(&grouped, &lookup, generation),
        };
        self.assemble(investments, grouped, &lookup, valuation, generation)
    }

    fn assemble(
        &self,
        investments: &[InvestmentRecord],
        grouped: GroupedInvestments,
        lookup: &CompanyLookup,
        valuation: Valuation,
        generation: u64,
    ) -> Result<PortfolioSnapshot, CoreError> {
        let summary = self.summarize(investments)?;
        let stock_distribution = self.stock_distribution(&grouped, lookup)?;
        let value_distribution = self.value_distribution(&valuation, &grouped, lookup);
        let company_colors = self
            .chart_service
            .assign_colors(&stock_distribution, &value_distribution);

        let calculating_value = valuation.still_loading;
        let live_value = if calculating_value {
            None
        } else {
            Some(valuation.total)
        };

        Ok(PortfolioSnapshot {
            generation,
            grouped,
            summary,
            stock_distribution,
            value_distribution,
            company_colors,
            live_value,
            calculating_value,
            valuation,
        })
    }
}

impl Default for AggregationService {
    fn default() -> Self {
        Self::new()
    }
}
