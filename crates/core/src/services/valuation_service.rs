use chrono::Utc;
use std::collections::HashSet;

use crate::models::analytics::{CompanyValue, PriceSource, RecordValue, Valuation};
use crate::models::company::CompanyLookup;
use crate::models::portfolio::GroupedInvestments;
use crate::models::price::LivePrices;

/// Values lots against live prices.
///
/// Pure business logic, no I/O. The network side lives in `PriceService`,
/// which hands a complete batch of prices to [`ValuationService::value_portfolio`].
pub struct ValuationService;

impl ValuationService {
    pub fn new() -> Self {
        Self
    }

    /// Distinct tickers referenced by the grouped lots, in first-seen order.
    /// Companies without a resolvable symbol are skipped; their lots are
    /// always valued at their base price.
    pub fn referenced_symbols(
        &self,
        grouped: &GroupedInvestments,
        lookup: &CompanyLookup,
    ) -> Vec<String> {
        let mut seen = HashSet::new();
        grouped
            .company_ids()
            .filter_map(|id| lookup.symbol_of(id))
            .filter(|symbol| seen.insert(symbol.clone()))
            .collect()
    }

    /// Value every lot in one pass.
    ///
    /// `current_value = (live price, else the lot's own base_price) * stock_unit`.
    /// Fallback is per lot, not per company: each lot keeps its own
    /// historical base price. `still_loading` is set while any referenced
    /// ticker has no entry in `live_prices` yet.
    pub fn value_portfolio(
        &self,
        grouped: &GroupedInvestments,
        lookup: &CompanyLookup,
        live_prices: &LivePrices,
        generation: u64,
    ) -> Valuation {
        let mut per_record_value = Vec::with_capacity(grouped.record_count());
        let mut per_company_value = Vec::with_capacity(grouped.len());
        let mut still_loading = false;

        for group in grouped.iter() {
            let symbol = lookup.symbol_of(&group.company);
            let live_price = match &symbol {
                Some(s) => {
                    if !live_prices.is_resolved(s) {
                        still_loading = true;
                    }
                    live_prices.price_of(s)
                }
                None => None,
            };

            let mut company_total = 0.0;
            for record in &group.investments {
                let (unit_price, source) = match live_price {
                    Some(p) => (p, PriceSource::Live),
                    None => (record.base_price, PriceSource::BasePrice),
                };
                let current_value = unit_price * record.stock_unit as f64;
                company_total += current_value;
                per_record_value.push(RecordValue {
                    investment_id: record.id.clone(),
                    company_id: group.company.clone(),
                    unit_price,
                    source,
                    current_value,
                });
            }

            per_company_value.push(CompanyValue {
                company_id: group.company.clone(),
                value: company_total,
            });
        }

        let total = per_company_value.iter().map(|c| c.value).sum();

        Valuation {
            generation,
            per_record_value,
            per_company_value,
            total,
            still_loading,
            as_of: Utc::now(),
        }
    }

    /// Valuation before any live price has arrived: base prices throughout,
    /// flagged as loading if there is anything to look up.
    pub fn pending(
        &self,
        grouped: &GroupedInvestments,
        lookup: &CompanyLookup,
        generation: u64,
    ) -> Valuation {
        self.value_portfolio(grouped, lookup, &LivePrices::new(), generation)
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}
