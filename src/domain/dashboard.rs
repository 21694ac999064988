//! One rendering pass: fetch, resolve the user's selection, filter, compute.
//!
//! Passes hold no state between calls. The only thing shared across
//! passes is whatever cache the gateway keeps.

use crate::domain::dates::DateRange;
use crate::domain::error::DashboardError;
use crate::domain::fundamentals::FundamentalSnapshot;
use crate::domain::performance::{portfolio_performance, PortfolioPerformance};
use crate::domain::price::{restore_symbol_label, single_symbol_relabel, PriceTable};
use crate::domain::symbol::{Symbol, SymbolMap};
use crate::domain::valuation::{
    compute_fundamental_metrics, graham_comparison, metric_map, FundamentalMetrics, GrahamPoint,
    MetricKind,
};
use crate::ports::data_port::MarketDataPort;

/// What the user picked. Empty `symbols` means every symbol in the
/// universe; `range: None` means the full loaded range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub symbols: Vec<Symbol>,
    pub range: Option<DateRange>,
}

impl Selection {
    /// The symbols this selection covers, in report order.
    pub fn symbols_in<'a>(&'a self, universe: &'a [Symbol]) -> &'a [Symbol] {
        if self.symbols.is_empty() {
            universe
        } else {
            &self.symbols
        }
    }
}

/// A selection checked against the data actually loaded.
///
/// Every selected symbol is kept, loaded or not, so symbols without prices
/// still reach the report as `N/A`. `range` is `None` when none of them
/// has price data.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSelection {
    pub symbols: Vec<Symbol>,
    pub range: Option<DateRange>,
}

pub fn resolve_selection(
    selection: &Selection,
    universe: &[Symbol],
    table: &PriceTable,
) -> Result<ResolvedSelection, DashboardError> {
    let symbols = selection.symbols_in(universe).to_vec();
    for symbol in &symbols {
        if table.get(symbol).is_none() {
            log::warn!("{symbol}: no price data loaded");
        }
    }

    let Some(bounds) = table.select(&symbols).bounds() else {
        return Ok(ResolvedSelection {
            symbols,
            range: None,
        });
    };

    let range = match selection.range {
        None => bounds,
        Some(wanted) => {
            let clamped =
                wanted
                    .clamp_to(&bounds)
                    .ok_or_else(|| DashboardError::InvalidDateRange {
                        start: wanted.start().to_string(),
                        end: wanted.end().to_string(),
                    })?;
            if clamped != wanted {
                log::warn!("date range {wanted} clamped to loaded data: {clamped}");
            }
            clamped
        }
    };

    Ok(ResolvedSelection {
        symbols,
        range: Some(range),
    })
}

/// The selected columns of `table`, filtered to `range`.
///
/// A single selection goes through the canonical-column relabel so the
/// filter addresses it the same way regardless of how many symbols are
/// picked. The symbol name is restored before anything is reported.
pub fn filtered_view(table: &PriceTable, symbols: &[Symbol], range: &DateRange) -> PriceTable {
    let selected = table.select(symbols);
    match symbols {
        [only] => {
            let relabelled = single_symbol_relabel(selected, only);
            restore_symbol_label(relabelled.filter(range), only)
        }
        _ => selected.filter(range),
    }
}

/// Output of the price evolution dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceDashboard {
    pub symbols: Vec<Symbol>,
    pub range: DateRange,
    /// Selected columns filtered to `range`, for charting.
    pub prices: PriceTable,
    pub performance: PortfolioPerformance,
}

/// Fails with `NoData` only when no selected symbol has prices; symbols
/// without prices are reported with no return.
pub fn price_pass(
    port: &dyn MarketDataPort,
    universe: &[Symbol],
    fetch_range: &DateRange,
    selection: &Selection,
    initial_per_symbol: f64,
) -> Result<PriceDashboard, DashboardError> {
    let requested = selection.symbols_in(universe);
    log::info!(
        "fetching prices for {} symbols, {}",
        requested.len(),
        fetch_range
    );
    let table = port.fetch_price_history(requested, fetch_range.start(), fetch_range.end());

    let resolved = resolve_selection(selection, universe, &table)?;
    let range = resolved.range.ok_or_else(|| DashboardError::NoData {
        reason: "none of the selected symbols has price data".into(),
    })?;
    let prices = filtered_view(&table, &resolved.symbols, &range);
    let performance = portfolio_performance(&prices, &resolved.symbols, initial_per_symbol);

    Ok(PriceDashboard {
        symbols: resolved.symbols,
        range,
        prices,
        performance,
    })
}

/// Output of the fundamentals dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct FundamentalsDashboard {
    pub symbols: Vec<Symbol>,
    pub range: DateRange,
    pub prices: PriceTable,
    pub snapshots: SymbolMap<FundamentalSnapshot>,
    pub metrics: SymbolMap<FundamentalMetrics>,
    pub graham: SymbolMap<Vec<GrahamPoint>>,
}

impl FundamentalsDashboard {
    /// Symbol → value for one metric kind, in selection order.
    pub fn metric_cards(&self, kind: MetricKind) -> SymbolMap<Option<f64>> {
        metric_map(&self.metrics, kind)
    }
}

/// Snapshot-only metrics (dividend yield, EBITDA, Graham value) do not
/// need prices, so the pass fails with `NoData` only when the selection
/// has neither prices nor snapshots.
pub fn fundamentals_pass(
    port: &dyn MarketDataPort,
    universe: &[Symbol],
    fetch_range: &DateRange,
    selection: &Selection,
) -> Result<FundamentalsDashboard, DashboardError> {
    let requested = selection.symbols_in(universe);
    log::info!(
        "fetching prices for {} symbols, {}",
        requested.len(),
        fetch_range
    );
    let table = port.fetch_price_history(requested, fetch_range.start(), fetch_range.end());
    let resolved = resolve_selection(selection, universe, &table)?;

    log::info!("fetching fundamentals for {} symbols", resolved.symbols.len());
    let snapshots = port.fetch_snapshots(&resolved.symbols);

    let range = match resolved.range {
        Some(range) => range,
        None if snapshots.is_empty() => {
            return Err(DashboardError::NoData {
                reason: "no prices or fundamentals for any selected symbol".into(),
            })
        }
        None => {
            log::warn!("no price data for the selection, showing fundamentals only");
            selection.range.unwrap_or(*fetch_range)
        }
    };

    let prices = filtered_view(&table, &resolved.symbols, &range);
    let metrics = compute_fundamental_metrics(&resolved.symbols, &table, &snapshots);
    let graham = graham_comparison(&resolved.symbols, &table, &snapshots, &range);

    Ok(FundamentalsDashboard {
        symbols: resolved.symbols,
        range,
        prices,
        snapshots,
        metrics,
        graham,
    })
}
