use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of a live price lookup for one ticker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Quote {
    /// Current unit price reported by a quote provider
    Available(f64),
    /// Every provider failed, timed out, or returned garbage
    Unavailable,
}

impl Quote {
    #[must_use]
    pub fn price(&self) -> Option<f64> {
        match self {
            Quote::Available(p) => Some(*p),
            Quote::Unavailable => None,
        }
    }
}

/// Live prices resolved for one refresh cycle, keyed by uppercase ticker.
///
/// Ephemeral: rebuilt on every refresh and never persisted. A symbol that
/// has no entry at all has not been resolved yet, which is different from
/// an entry of [`Quote::Unavailable`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LivePrices {
    quotes: HashMap<String, Quote>,

    /// When the batch finished resolving
    pub fetched_at: Option<DateTime<Utc>>,
}

impl LivePrices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(symbol, price)` pairs; `None` marks the symbol unavailable.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<f64>)>,
        S: AsRef<str>,
    {
        let mut prices = Self::new();
        for (symbol, price) in pairs {
            match price {
                Some(p) => prices.set_available(symbol.as_ref(), p),
                None => prices.set_unavailable(symbol.as_ref()),
            }
        }
        prices
    }

    pub fn set_available(&mut self, symbol: &str, price: f64) {
        self.quotes
            .insert(symbol.trim().to_uppercase(), Quote::Available(price));
    }

    pub fn set_unavailable(&mut self, symbol: &str) {
        self.quotes
            .insert(symbol.trim().to_uppercase(), Quote::Unavailable);
    }

    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<Quote> {
        self.quotes.get(&symbol.trim().to_uppercase()).copied()
    }

    /// Whether this symbol has been resolved (available or not).
    #[must_use]
    pub fn is_resolved(&self, symbol: &str) -> bool {
        self.quotes.contains_key(&symbol.trim().to_uppercase())
    }

    /// Live unit price, if the lookup succeeded.
    #[must_use]
    pub fn price_of(&self, symbol: &str) -> Option<f64> {
        self.get(symbol).and_then(|q| q.price())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Number of symbols that resolved to an actual price.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.quotes
            .values()
            .filter(|q| matches!(q, Quote::Available(_)))
            .count()
    }
}
