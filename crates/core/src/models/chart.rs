use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ids::CompanyId;

/// Fixed chart palette. Companies are assigned colors in first-seen order
/// and wrap around once the palette is exhausted.
pub const PALETTE: [&str; 30] = [
    "#FF5733", "#33FF57", "#3357FF", "#FF33A8", "#A833FF", "#FF8C33", "#33FFF4", "#FFC300",
    "#00A8FF", "#C70039", "#581845", "#009688", "#FFD700", "#40E0D0", "#8A2BE2", "#FF4500",
    "#7FFF00", "#DC143C", "#00CED1", "#FF1493", "#1E90FF", "#ADFF2F", "#FF69B4", "#00FF7F",
    "#6A5ACD", "#F08080", "#20B2AA", "#FFA07A", "#9370DB", "#3CB371",
];

/// Color used for a company that was never assigned one.
pub const FALLBACK_COLOR: &str = "#8884d8";

/// One slice of a per-company pie chart.
///
/// Keyed by company id; `name` is only for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionDatum {
    pub company_id: CompanyId,
    pub name: String,
    pub value: f64,
}

/// One legend row: which color stands for which company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub company_id: CompanyId,
    pub name: String,
    pub color: String,
}

/// Stable company → color mapping shared by every chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyColors {
    colors: HashMap<CompanyId, String>,
}

impl CompanyColors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the next palette color if the company has none yet.
    /// Returns true when a new color was assigned.
    pub fn assign(&mut self, company: &CompanyId) -> bool {
        if self.colors.contains_key(company) {
            return false;
        }
        let color = PALETTE[self.colors.len() % PALETTE.len()];
        self.colors.insert(company.clone(), color.to_string());
        true
    }

    #[must_use]
    pub fn get(&self, company: &CompanyId) -> Option<&str> {
        self.colors.get(company).map(String::as_str)
    }

    /// Color for a company, or [`FALLBACK_COLOR`].
    #[must_use]
    pub fn color_for(&self, company: &CompanyId) -> &str {
        self.get(company).unwrap_or(FALLBACK_COLOR)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}
