use crate::models::chart::{CompanyColors, DistributionDatum, LegendEntry};

/// Chart colors and legends.
///
/// The core computes the numbers and the colors; the frontend only
/// renders. Colors are keyed by company id so both pie charts agree.
pub struct ChartService;

impl ChartService {
    pub fn new() -> Self {
        Self
    }

    /// Assign palette colors in first-seen order across the stock
    /// distribution followed by the value distribution.
    ///
    /// Deterministic: the same inputs always yield the same mapping. Past
    /// the end of the palette colors wrap around and may repeat.
    pub fn assign_colors(
        &self,
        stock_distribution: &[DistributionDatum],
        value_distribution: &[DistributionDatum],
    ) -> CompanyColors {
        let mut colors = CompanyColors::new();
        for datum in stock_distribution.iter().chain(value_distribution) {
            colors.assign(&datum.company_id);
        }
        colors
    }

    /// Legend rows for one chart, in the chart's own order.
    pub fn legend(
        &self,
        distribution: &[DistributionDatum],
        colors: &CompanyColors,
    ) -> Vec<LegendEntry> {
        distribution
            .iter()
            .map(|d| LegendEntry {
                company_id: d.company_id.clone(),
                name: d.name.clone(),
                color: colors.color_for(&d.company_id).to_string(),
            })
            .collect()
    }
}

impl Default for ChartService {
    fn default() -> Self {
        Self::new()
    }
}
