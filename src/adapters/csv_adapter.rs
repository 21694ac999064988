//! CSV file adapters: the ticker universe file and an offline market-data gateway.
//!
//! The gateway reads a data directory laid out as:
//!
//! ```text
//! <base>/<SYMBOL>.csv        date,close
//! <base>/fundamentals.csv    symbol,eps,book_value,dividend_rate,current_price,total_revenue,ebitda_margin
//! ```
//!
//! Dates may be plain `YYYY-MM-DD` or offset-aware RFC 3339; both are
//! normalized on read. Empty fundamentals cells mean the field is absent.

use crate::domain::dates::parse_date_input;
use crate::domain::error::DashboardError;
use crate::domain::fundamentals::{FundamentalField, FundamentalSnapshot};
use crate::domain::price::{PricePoint, PriceSeries};
use crate::domain::symbol::Symbol;
use crate::domain::universe::{normalize_codes, Universe, UniverseSpec};
use crate::ports::data_port::MarketDataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

pub const FUNDAMENTALS_FILE: &str = "fundamentals.csv";

/// Read the universe file and normalize its codes into symbols.
pub fn load_universe(path: &Path, spec: &UniverseSpec) -> Result<Universe, DashboardError> {
    let display = path.display().to_string();
    let content = fs::read(path).map_err(|e| DashboardError::data_load(&display, e))?;

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(spec.delimiter)
        .trim(csv::Trim::All)
        .from_reader(content.as_slice());

    let headers = rdr
        .headers()
        .map_err(|e| DashboardError::data_load(&display, format!("CSV parse error: {}", e)))?
        .clone();
    let column = headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == spec.column)
        .ok_or_else(|| {
            DashboardError::data_load(&display, format!("missing column '{}'", spec.column))
        })?;

    let mut codes = Vec::new();
    for result in rdr.records() {
        let record = result
            .map_err(|e| DashboardError::data_load(&display, format!("CSV parse error: {}", e)))?;
        if let Some(code) = record.get(column) {
            codes.push(code.to_string());
        }
    }

    let symbols = normalize_codes(codes, &spec.suffix);
    if symbols.is_empty() {
        return Err(DashboardError::data_load(&display, "no ticker codes found"));
    }
    log::info!("loaded {} symbols from {}", symbols.len(), display);
    Ok(Universe { symbols })
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn price_path(&self, symbol: &Symbol) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn parse_optional(value: Option<&str>) -> Result<Option<f64>, String> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<f64>()
            .map(Some)
            .map_err(|e| format!("invalid number '{}': {}", s, e)),
    }
}

fn csv_error(symbol: &Symbol, e: csv::Error) -> DashboardError {
    DashboardError::fetch(symbol.as_str(), format!("CSV parse error: {}", e))
}

impl MarketDataPort for CsvAdapter {
    fn fetch_price_series(
        &self,
        symbol: &Symbol,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, DashboardError> {
        let path = self.price_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| {
            let reason = format!("failed to read {}: {}", path.display(), e);
            DashboardError::fetch(symbol.as_str(), reason)
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut points = Vec::new();

        for result in rdr.records() {
            let record = result
                .map_err(|e| csv_error(symbol, e))?;

            let date_str = record
                .get(0)
                .ok_or_else(|| DashboardError::fetch(symbol.as_str(), "missing date column"))?;
            let date = parse_date_input(date_str).ok_or_else(|| {
                DashboardError::fetch(symbol.as_str(), format!("invalid date '{}'", date_str))
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            // Missing closes are skipped, never zero-filled.
            let close = parse_optional(record.get(1))
                .map_err(|e| DashboardError::fetch(symbol.as_str(), e))?;
            if let Some(close) = close {
                points.push(PricePoint::new(date, close));
            }
        }

        Ok(PriceSeries::new(points))
    }

    fn fetch_snapshot(&self, symbol: &Symbol) -> Result<FundamentalSnapshot, DashboardError> {
        let path = self.base_path.join(FUNDAMENTALS_FILE);
        let content = fs::read_to_string(&path).map_err(|e| {
            let reason = format!("failed to read {}: {}", path.display(), e);
            DashboardError::fetch(symbol.as_str(), reason)
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| csv_error(symbol, e))?
            .clone();
        let fields: Vec<Option<FundamentalField>> = headers
            .iter()
            .map(FundamentalField::from_column_name)
            .collect();

        for result in rdr.records() {
            let record = result
                .map_err(|e| csv_error(symbol, e))?;
            let row_symbol = record.get(0).map(str::trim).unwrap_or_default();
            if !row_symbol.eq_ignore_ascii_case(symbol.as_str()) {
                continue;
            }

            let mut snapshot = FundamentalSnapshot::default();
            for (i, field) in fields.iter().enumerate() {
                let Some(field) = field else { continue };
                let value = parse_optional(record.get(i)).map_err(|e| {
                    DashboardError::fetch(symbol.as_str(), format!("{}: {}", field, e))
                })?;
                snapshot.set(*field, value);
            }
            return Ok(snapshot);
        }

        Err(DashboardError::fetch(
            symbol.as_str(),
            format!("not listed in {}", path.display()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        fs::write(
            path.join("PETR4.SA.csv"),
            "date,close\n\
             2024-01-17,38.5\n\
             2024-01-15,37.0\n\
             2024-01-16T00:00:00-03:00,37.8\n\
             2024-01-18,\n",
        )
        .unwrap();
        fs::write(path.join("VALE3.SA.csv"), "date,close\n").unwrap();
        fs::write(
            path.join(FUNDAMENTALS_FILE),
            "symbol,eps,book_value,dividend_rate,current_price,total_revenue,ebitda_margin\n\
             PETR4.SA,7.5,30.1,4.2,38.5,500000000000,0.45\n\
             VALE3.SA,6.0,,3.1,65.0,,\n",
        )
        .unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_price_series_sorted_and_normalized() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let series = adapter
            .fetch_price_series(&Symbol::from("PETR4.SA"), d(2024, 1, 1), d(2024, 1, 31))
            .unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.points()[0].date, d(2024, 1, 15));
        assert_eq!(series.points()[1].date, d(2024, 1, 16));
        assert_eq!(series.points()[2].close, 38.5);
    }

    #[test]
    fn fetch_price_series_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let series = adapter
            .fetch_price_series(&Symbol::from("PETR4.SA"), d(2024, 1, 16), d(2024, 1, 16))
            .unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series.points()[0].close, 37.8);
    }

    #[test]
    fn fetch_price_series_missing_file_is_fetch_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let result =
            adapter.fetch_price_series(&Symbol::from("XYZ.SA"), d(2024, 1, 1), d(2024, 1, 31));
        assert!(matches!(result, Err(DashboardError::Fetch { symbol, .. }) if symbol == "XYZ.SA"));
    }

    #[test]
    fn fetch_snapshot_reads_row_with_blanks_as_absent() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let petr = adapter.fetch_snapshot(&Symbol::from("PETR4.SA")).unwrap();
        assert_eq!(petr.eps, Some(7.5));
        assert_eq!(petr.ebitda_margin, Some(0.45));

        let vale = adapter.fetch_snapshot(&Symbol::from("VALE3.SA")).unwrap();
        assert_eq!(vale.eps, Some(6.0));
        assert_eq!(vale.book_value, None);
        assert_eq!(vale.total_revenue, None);
    }

    #[test]
    fn fetch_snapshot_unlisted_symbol_is_fetch_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert!(adapter.fetch_snapshot(&Symbol::from("ITUB4.SA")).is_err());
    }

    #[test]
    fn fetch_price_history_skips_empty_and_failing() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let symbols = [
            Symbol::from("XYZ.SA"),
            Symbol::from("VALE3.SA"),
            Symbol::from("PETR4.SA"),
        ];

        let table = adapter.fetch_price_history(&symbols, d(2024, 1, 1), d(2024, 1, 31));
        let labels: Vec<&str> = table.labels().collect();
        assert_eq!(labels, vec!["PETR4.SA"]);
    }

    #[test]
    fn load_universe_semicolon_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("IBOV.csv");
        fs::write(
            &path,
            "Código;Ação;Tipo\nPETR4;PETROBRAS;PN\nVALE3;VALE;ON\nPETR4;PETROBRAS;PN\n",
        )
        .unwrap();

        let universe = load_universe(&path, &UniverseSpec::default()).unwrap();
        assert_eq!(
            universe.symbols,
            vec![Symbol::from("PETR4.SA"), Symbol::from("VALE3.SA")]
        );
    }

    #[test]
    fn load_universe_missing_file() {
        let result = load_universe(Path::new("/nonexistent/IBOV.csv"), &UniverseSpec::default());
        assert!(matches!(result, Err(DashboardError::DataLoad { .. })));
    }

    #[test]
    fn load_universe_missing_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("IBOV.csv");
        fs::write(&path, "Ticker;Nome\nPETR4;PETROBRAS\n").unwrap();

        let result = load_universe(&path, &UniverseSpec::default());
        assert!(
            matches!(result, Err(DashboardError::DataLoad { reason, .. }) if reason.contains("Código"))
        );
    }

    #[test]
    fn load_universe_custom_spec() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickers.csv");
        fs::write(&path, "ticker,name\nBHP,BHP Group\nCBA,Commonwealth\n").unwrap();
        let spec = UniverseSpec {
            column: "ticker".into(),
            suffix: ".AX".into(),
            delimiter: b',',
        };

        let universe = load_universe(&path, &spec).unwrap();
        assert_eq!(universe.symbols, vec![Symbol::from("BHP.AX"), Symbol::from("CBA.AX")]);
    }
}
