//! Equal-weight portfolio performance over the filtered range.

use crate::domain::price::{PriceSeries, PriceTable};
use crate::domain::symbol::{Symbol, SymbolMap};

pub const DEFAULT_INITIAL_PER_SYMBOL: f64 = 1000.0;

/// Fixed notional per selected symbol. Recomputed whenever the selection changes.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioAllocation {
    pub symbols: Vec<Symbol>,
    pub initial_per_symbol: f64,
}

impl PortfolioAllocation {
    pub fn equal_weight(symbols: &[Symbol], initial_per_symbol: f64) -> Self {
        Self {
            symbols: symbols.to_vec(),
            initial_per_symbol,
        }
    }
}

/// Display classification of a signed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Positive,
    Negative,
    Zero,
}

impl Sign {
    pub fn of(value: f64) -> Self {
        if value > 0.0 {
            Sign::Positive
        } else if value < 0.0 {
            Sign::Negative
        } else {
            Sign::Zero
        }
    }
}

/// `0.1234` → `12.34%`
pub fn format_percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioPerformance {
    pub allocation: PortfolioAllocation,
    /// `None` for symbols with fewer than two observations in range.
    pub per_symbol: SymbolMap<Option<f64>>,
    /// `None` when no symbol had a usable return.
    pub aggregate: Option<f64>,
}

impl PortfolioPerformance {
    /// Number of symbols that contributed to the aggregate.
    pub fn contributing(&self) -> usize {
        self.per_symbol.values().filter(|r| r.is_some()).count()
    }

    /// Value of each symbol's slice at the end of the range.
    pub fn final_values(&self) -> SymbolMap<Option<f64>> {
        let initial = self.allocation.initial_per_symbol;
        self.per_symbol
            .iter()
            .map(|(s, r)| (s.clone(), r.map(|r| initial * (1.0 + r))))
            .collect()
    }
}

/// `last / first - 1`. Undefined for fewer than two points or a non-positive first close.
pub fn symbol_return(series: &PriceSeries) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }
    let first = series.first()?.close;
    let last = series.last()?.close;
    if first <= 0.0 {
        return None;
    }
    let r = last / first - 1.0;
    r.is_finite().then_some(r)
}

/// Per-symbol and aggregate return of an equal-weight allocation.
///
/// Symbols without a usable return are reported as `None` and left out of
/// both the numerator and the denominator of the aggregate.
pub fn portfolio_performance(
    table: &PriceTable,
    selected: &[Symbol],
    initial_per_symbol: f64,
) -> PortfolioPerformance {
    let allocation = PortfolioAllocation::equal_weight(selected, initial_per_symbol);

    let per_symbol: SymbolMap<Option<f64>> = selected
        .iter()
        .map(|symbol| {
            let r = table.get(symbol).and_then(symbol_return);
            if r.is_none() {
                log::warn!("{symbol}: fewer than 2 observations in range, return unavailable");
            }
            (symbol.clone(), r)
        })
        .collect();

    let returns: Vec<f64> = per_symbol.values().filter_map(|r| *r).collect();
    let aggregate = if returns.is_empty() || initial_per_symbol <= 0.0 {
        None
    } else {
        let initial_total = initial_per_symbol * returns.len() as f64;
        let final_total: f64 = returns.iter().map(|r| initial_per_symbol * (1.0 + r)).sum();
        Some(final_total / initial_total - 1.0)
    };

    PortfolioPerformance {
        allocation,
        per_symbol,
        aggregate,
    }
}
