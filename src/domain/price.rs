//! Close-price series and the multi-symbol price table.

use crate::domain::dates::{filter_by_date_range, DateRange, Dated, NormalizeDate};
use crate::domain::symbol::Symbol;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Canonical column label used while a single symbol is selected.
pub const CLOSE_COLUMN: &str = "Close";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: impl NormalizeDate, close: f64) -> Self {
        Self {
            date: date.normalize_date(),
            close,
        }
    }
}

impl Dated for PricePoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Daily closes for one symbol, ascending by date, one point per date.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Sorts by date; a later duplicate date replaces the earlier one.
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }
        Self { points: deduped }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn bounds(&self) -> Option<DateRange> {
        let first = self.first()?;
        let last = self.last()?;
        DateRange::new(first.date, last.date).ok()
    }

    pub fn filter(&self, range: &DateRange) -> PriceSeries {
        PriceSeries {
            points: filter_by_date_range(&self.points, range),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceColumn {
    pub label: String,
    pub series: PriceSeries,
}

/// Labelled close-price columns aligned on a shared date index.
///
/// The date index is the sorted union of every column's dates. A column
/// with no observation on an index date simply has no value there.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceTable {
    columns: Vec<PriceColumn>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the column for `label`, keeping its position.
    pub fn insert(&mut self, label: impl Into<String>, series: PriceSeries) {
        let label = label.into();
        match self.columns.iter_mut().find(|c| c.label == label) {
            Some(column) => column.series = series,
            None => self.columns.push(PriceColumn { label, series }),
        }
    }

    pub fn columns(&self) -> &[PriceColumn] {
        &self.columns
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.label.as_str())
    }

    pub fn column(&self, label: &str) -> Option<&PriceSeries> {
        self.columns
            .iter()
            .find(|c| c.label == label)
            .map(|c| &c.series)
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&PriceSeries> {
        self.column(symbol.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn date_index(&self) -> Vec<NaiveDate> {
        let unique: BTreeSet<NaiveDate> = self
            .columns
            .iter()
            .flat_map(|c| c.series.points().iter().map(|p| p.date))
            .collect();
        unique.into_iter().collect()
    }

    /// Earliest and latest date across all columns.
    pub fn bounds(&self) -> Option<DateRange> {
        let index = self.date_index();
        let first = index.first()?;
        let last = index.last()?;
        DateRange::new(*first, *last).ok()
    }

    /// Keep only the named columns, in the order given. Unknown labels are skipped.
    pub fn select(&self, symbols: &[Symbol]) -> PriceTable {
        let mut table = PriceTable::new();
        for symbol in symbols {
            if let Some(series) = self.get(symbol) {
                table.insert(symbol.as_str(), series.clone());
            }
        }
        table
    }

    /// Apply the same range to every column.
    pub fn filter(&self, range: &DateRange) -> PriceTable {
        PriceTable {
            columns: self
                .columns
                .iter()
                .map(|c| PriceColumn {
                    label: c.label.clone(),
                    series: c.series.filter(range),
                })
                .collect(),
        }
    }

    fn rename(mut self, from: &str, to: &str) -> PriceTable {
        if self.column(to).is_none() {
            if let Some(column) = self.columns.iter_mut().find(|c| c.label == from) {
                column.label = to.to_string();
            }
        }
        self
    }
}

/// When `table` holds only `symbol`, address its column by [`CLOSE_COLUMN`].
///
/// Tables with any other shape are returned untouched.
pub fn single_symbol_relabel(table: PriceTable, symbol: &Symbol) -> PriceTable {
    if table.len() == 1 {
        table.rename(symbol.as_str(), CLOSE_COLUMN)
    } else {
        table
    }
}

/// Inverse of [`single_symbol_relabel`]: put the symbol name back.
pub fn restore_symbol_label(table: PriceTable, symbol: &Symbol) -> PriceTable {
    if table.len() == 1 {
        table.rename(CLOSE_COLUMN, symbol.as_str())
    } else {
        table
    }
}
