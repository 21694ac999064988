//! Instrument symbols and the symbol-keyed mapping used for per-symbol results.

use std::fmt;

/// Normalized, exchange-suffixed instrument identifier (e.g. `PETR4.SA`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(symbol: impl Into<String>) -> Self {
        Symbol(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Symbol → value mapping that preserves insertion order.
///
/// Per-symbol results are always reported in selection order, so a plain
/// `HashMap` is not enough. Lookups return `Option` rather than relying
/// on key-existence checks at call sites.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolMap<T> {
    entries: Vec<(Symbol, T)>,
}

impl<T> SymbolMap<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert or replace. A replaced entry keeps its original position.
    pub fn insert(&mut self, symbol: Symbol, value: T) -> Option<T> {
        match self.entries.iter_mut().find(|(s, _)| *s == symbol) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((symbol, value));
                None
            }
        }
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&T> {
        self.entries
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.get(symbol).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.iter().map(|(s, _)| s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &T)> {
        self.entries.iter().map(|(s, v)| (s, v))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<T> Default for SymbolMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(Symbol, T)> for SymbolMap<T> {
    fn from_iter<I: IntoIterator<Item = (Symbol, T)>>(iter: I) -> Self {
        let mut map = SymbolMap::new();
        for (symbol, value) in iter {
            map.insert(symbol, value);
        }
        map
    }
}

impl<T> IntoIterator for SymbolMap<T> {
    type Item = (Symbol, T);
    type IntoIter = std::vec::IntoIter<(Symbol, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
