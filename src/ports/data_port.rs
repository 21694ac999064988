//! Market data gateway port.
//!
//! Implementations fetch one symbol at a time. The provided batch methods
//! contain per-symbol failures: a failing symbol is logged and left out,
//! every other symbol is still returned, in request order.

use crate::domain::error::DashboardError;
use crate::domain::fundamentals::FundamentalSnapshot;
use crate::domain::price::{PriceSeries, PriceTable};
use crate::domain::symbol::{Symbol, SymbolMap};
use chrono::NaiveDate;

pub trait MarketDataPort {
    fn fetch_price_series(
        &self,
        symbol: &Symbol,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, DashboardError>;

    fn fetch_snapshot(&self, symbol: &Symbol) -> Result<FundamentalSnapshot, DashboardError>;

    fn fetch_price_history(
        &self,
        symbols: &[Symbol],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> PriceTable {
        collect_price_history(self, symbols, start_date, end_date).table
    }

    fn fetch_snapshots(&self, symbols: &[Symbol]) -> SymbolMap<FundamentalSnapshot> {
        let mut snapshots = SymbolMap::new();
        for symbol in symbols {
            match self.fetch_snapshot(symbol) {
                Ok(snapshot) => {
                    snapshots.insert(symbol.clone(), snapshot);
                }
                Err(e) => log::warn!("no fundamentals for {symbol} ({e})"),
            }
        }
        snapshots
    }
}

/// A batch of price series and whether every fetch succeeded. Symbols that
/// returned an empty series still count as fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    pub table: PriceTable,
    pub complete: bool,
}

/// Fetches each symbol through [`MarketDataPort::fetch_price_series`],
/// skipping failures and empty series.
pub fn collect_price_history<P: MarketDataPort + ?Sized>(
    port: &P,
    symbols: &[Symbol],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> PriceHistory {
    let mut table = PriceTable::new();
    let mut complete = true;
    for symbol in symbols {
        match port.fetch_price_series(symbol, start_date, end_date) {
            Ok(series) if series.is_empty() => {
                log::warn!("skipping {symbol} (no price data)");
            }
            Ok(series) => table.insert(symbol.as_str(), series),
            Err(e) => {
                complete = false;
                log::warn!("skipping {symbol} ({e})");
            }
        }
    }
    PriceHistory { table, complete }
}
