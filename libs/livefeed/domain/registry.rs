//! Reference-counted symbol subscriptions
//!
//! Many consumers may watch the same symbol. The wire subscription is only
//! opened when the first consumer arrives and closed when the last leaves.

use std::collections::BTreeMap;

/// Normalize a symbol the way the backend keys it
pub fn normalize_symbol(symbol: &str) -> Option<String> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

/// Symbol -> number of consumers currently interested in it
///
/// A symbol is present iff its count is at least one.
#[derive(Debug, Default, Clone)]
pub struct SymbolSubscriptions {
    counts: BTreeMap<String, u32>,
}

impl SymbolSubscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one reference per symbol
    ///
    /// Returns the symbols that went from zero to one reference, in the order
    /// first seen. A symbol repeated in the input is counted every time but
    /// reported at most once.
    pub fn acquire<I, S>(&mut self, symbols: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut newly_added = Vec::new();

        for symbol in symbols {
            let Some(symbol) = normalize_symbol(symbol.as_ref()) else {
                continue;
            };

            let count = self.counts.entry(symbol.clone()).or_insert(0);
            *count = count.saturating_add(1);

            if *count == 1 {
                newly_added.push(symbol);
            }
        }

        newly_added
    }

    /// Drop one reference per symbol
    ///
    /// Returns the symbols whose last reference was released. Symbols with
    /// no references are ignored.
    pub fn release<I, S>(&mut self, symbols: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut removed = Vec::new();

        for symbol in symbols {
            let Some(symbol) = normalize_symbol(symbol.as_ref()) else {
                continue;
            };

            let Some(count) = self.counts.get_mut(&symbol) else {
                continue;
            };

            *count -= 1;
            if *count == 0 {
                self.counts.remove(&symbol);
                removed.push(symbol);
            }
        }

        removed
    }

    /// All symbols with at least one reference, sorted
    pub fn snapshot(&self) -> Vec<String> {
        self.counts.keys().cloned().collect()
    }

    pub fn ref_count(&self, symbol: &str) -> u32 {
        normalize_symbol(symbol)
            .and_then(|s| self.counts.get(&s).copied())
            .unwrap_or(0)
    }

    pub fn is_subscribed(&self, symbol: &str) -> bool {
        self.ref_count(symbol) > 0
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
