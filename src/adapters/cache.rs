//! Read-through cache in front of any market data gateway.
//!
//! Entries live for the lifetime of the process and are never invalidated.
//! Failed fetches are not stored, so the next pass asks the provider again.

use crate::domain::error::DashboardError;
use crate::domain::fundamentals::FundamentalSnapshot;
use crate::domain::price::{PriceSeries, PriceTable};
use crate::domain::symbol::Symbol;
use crate::ports::data_port::{collect_price_history, MarketDataPort};
use chrono::NaiveDate;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

type HistoryKey = (Vec<Symbol>, NaiveDate, NaiveDate);
type SeriesKey = (Symbol, NaiveDate, NaiveDate);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

pub struct CachingDataPort<P: MarketDataPort> {
    inner: P,
    history: RefCell<HashMap<HistoryKey, PriceTable>>,
    series: RefCell<HashMap<SeriesKey, PriceSeries>>,
    snapshots: RefCell<HashMap<Symbol, FundamentalSnapshot>>,
    hits: Cell<usize>,
    misses: Cell<usize>,
}

impl<P: MarketDataPort> CachingDataPort<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            history: RefCell::new(HashMap::new()),
            series: RefCell::new(HashMap::new()),
            snapshots: RefCell::new(HashMap::new()),
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.get(),
            misses: self.misses.get(),
        }
    }

    fn hit(&self, what: &str) {
        self.hits.set(self.hits.get() + 1);
        log::debug!("cache hit: {what}");
    }

    fn miss(&self, what: &str) {
        self.misses.set(self.misses.get() + 1);
        log::debug!("cache miss: {what}");
    }
}

impl<P: MarketDataPort> MarketDataPort for CachingDataPort<P> {
    fn fetch_price_series(
        &self,
        symbol: &Symbol,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, DashboardError> {
        let key = (symbol.clone(), start_date, end_date);
        if let Some(series) = self.series.borrow().get(&key) {
            self.hit(&format!("prices {symbol} {start_date}..{end_date}"));
            return Ok(series.clone());
        }

        self.miss(&format!("prices {symbol} {start_date}..{end_date}"));
        let series = self.inner.fetch_price_series(symbol, start_date, end_date)?;
        self.series.borrow_mut().insert(key, series.clone());
        Ok(series)
    }

    fn fetch_snapshot(&self, symbol: &Symbol) -> Result<FundamentalSnapshot, DashboardError> {
        if let Some(snapshot) = self.snapshots.borrow().get(symbol) {
            self.hit(&format!("fundamentals {symbol}"));
            return Ok(*snapshot);
        }

        self.miss(&format!("fundamentals {symbol}"));
        let snapshot = self.inner.fetch_snapshot(symbol)?;
        self.snapshots.borrow_mut().insert(symbol.clone(), snapshot);
        Ok(snapshot)
    }

    /// Whole batches are cached by their argument tuple. A miss falls back
    /// to the per-symbol path, which has its own cache.
    fn fetch_price_history(
        &self,
        symbols: &[Symbol],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> PriceTable {
        let key = (symbols.to_vec(), start_date, end_date);
        if let Some(table) = self.history.borrow().get(&key) {
            self.hit(&format!("history of {} symbols", symbols.len()));
            return table.clone();
        }

        self.miss(&format!("history of {} symbols", symbols.len()));
        let history = collect_price_history(self, symbols, start_date, end_date);
        if history.complete {
            self.history.borrow_mut().insert(key, history.table.clone());
        }
        history.table
    }
}
