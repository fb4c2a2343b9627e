use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ids::CompanyId;

/// A listed company investments can be made against.
///
/// Reference data owned by the backend; the client only ever reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,

    /// Display name (e.g., "Apple Inc.")
    pub name: String,

    /// Ticker symbol as served by the backend (e.g., "AAPL")
    #[serde(default)]
    pub symbol: String,
}

impl Company {
    pub fn new(id: impl Into<CompanyId>, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            symbol: symbol.into(),
        }
    }

    /// Normalized ticker (trimmed, uppercased), or `None` when the backend
    /// has no usable symbol for this company.
    #[must_use]
    pub fn ticker(&self) -> Option<String> {
        let trimmed = self.symbol.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_uppercase())
        }
    }
}

/// Read-only index over the company list, keyed by canonical id.
#[derive(Debug, Clone, Default)]
pub struct CompanyLookup {
    by_id: HashMap<CompanyId, Company>,
}

impl CompanyLookup {
    pub fn new(companies: &[Company]) -> Self {
        let by_id = companies
            .iter()
            .map(|c| (c.id.clone(), c.clone()))
            .collect();
        Self { by_id }
    }

    #[must_use]
    pub fn get(&self, id: &CompanyId) -> Option<&Company> {
        self.by_id.get(id)
    }

    /// Display name, falling back to a placeholder for companies the
    /// backend no longer lists.
    #[must_use]
    pub fn name_of(&self, id: &CompanyId) -> String {
        self.by_id
            .get(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("Company {id}"))
    }

    #[must_use]
    pub fn symbol_of(&self, id: &CompanyId) -> Option<String> {
        self.by_id.get(id).and_then(Company::ticker)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
