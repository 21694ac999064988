#![allow(dead_code)]

use chrono::NaiveDate;
use equidash::domain::error::DashboardError;
use equidash::domain::fundamentals::FundamentalSnapshot;
use equidash::domain::price::{PricePoint, PriceSeries};
use equidash::domain::symbol::Symbol;
use equidash::ports::data_port::MarketDataPort;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockDataPort {
    pub prices: HashMap<String, Vec<PricePoint>>,
    pub snapshots: HashMap<String, FundamentalSnapshot>,
    pub errors: HashMap<String, String>,
    pub snapshot_errors: HashMap<String, String>,
    pub calls: RefCell<Vec<String>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            prices: HashMap::new(),
            snapshots: HashMap::new(),
            errors: HashMap::new(),
            snapshot_errors: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_closes(mut self, symbol: &str, closes: &[(&str, f64)]) -> Self {
        let points = closes.iter().map(|(d, c)| PricePoint::new(date(d), *c)).collect();
        self.prices.insert(symbol.to_string(), points);
        self
    }

    pub fn with_snapshot(mut self, symbol: &str, snapshot: FundamentalSnapshot) -> Self {
        self.snapshots.insert(symbol.to_string(), snapshot);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    /// Fail only the fundamentals call; prices still load.
    pub fn with_snapshot_error(mut self, symbol: &str, reason: &str) -> Self {
        self.snapshot_errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl MarketDataPort for MockDataPort {
    fn fetch_price_series(
        &self,
        symbol: &Symbol,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, DashboardError> {
        self.calls.borrow_mut().push(format!("prices {symbol}"));
        if let Some(reason) = self.errors.get(symbol.as_str()) {
            return Err(DashboardError::fetch(symbol.as_str(), reason));
        }
        let points = self
            .prices
            .get(symbol.as_str())
            .map(|points| {
                points
                    .iter()
                    .filter(|p| p.date >= start_date && p.date <= end_date)
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        Ok(PriceSeries::new(points))
    }

    fn fetch_snapshot(&self, symbol: &Symbol) -> Result<FundamentalSnapshot, DashboardError> {
        self.calls.borrow_mut().push(format!("fundamentals {symbol}"));
        let failure = self
            .errors
            .get(symbol.as_str())
            .or_else(|| self.snapshot_errors.get(symbol.as_str()));
        if let Some(reason) = failure {
            return Err(DashboardError::fetch(symbol.as_str(), reason));
        }
        self.snapshots
            .get(symbol.as_str())
            .copied()
            .ok_or_else(|| DashboardError::fetch(symbol.as_str(), "no fundamentals"))
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn symbols(names: &[&str]) -> Vec<Symbol> {
    names.iter().map(|n| Symbol::from(*n)).collect()
}

pub fn snapshot(
    eps: f64,
    book_value: f64,
    dividend_rate: f64,
    current_price: f64,
) -> FundamentalSnapshot {
    FundamentalSnapshot {
        eps: Some(eps),
        book_value: Some(book_value),
        dividend_rate: Some(dividend_rate),
        current_price: Some(current_price),
        total_revenue: None,
        ebitda_margin: None,
    }
}

/// Three symbols over one week. C.SA has a single observation.
pub fn sample_port() -> MockDataPort {
    MockDataPort::new()
        .with_closes(
            "A.SA",
            &[
                ("2024-01-01", 10.0),
                ("2024-01-02", 11.0),
                ("2024-01-03", 12.0),
                ("2024-01-05", 15.0),
            ],
        )
        .with_closes(
            "B.SA",
            &[("2024-01-02", 20.0), ("2024-01-03", 19.0), ("2024-01-04", 18.0)],
        )
        .with_closes("C.SA", &[("2024-01-03", 5.0)])
        .with_snapshot("A.SA", snapshot(3.0, 30.0, 1.5, 15.0))
        .with_snapshot("B.SA", snapshot(-2.0, 40.0, 0.0, 18.0))
}
