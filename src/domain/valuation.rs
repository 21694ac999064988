//! Fundamental ratios: P/E, dividend yield, EBITDA estimate and Graham value.
//!
//! Every function returns `None` when an input is absent or the formula is
//! undefined for it. No sentinel zeros.

use crate::domain::dates::{filter_by_date_range, DateRange, Dated};
use crate::domain::fundamentals::FundamentalSnapshot;
use crate::domain::price::{PriceSeries, PriceTable};
use crate::domain::symbol::{Symbol, SymbolMap};
use chrono::NaiveDate;
use std::fmt;

/// Graham's multiplier: P/E of 15 times P/B of 1.5.
pub const GRAHAM_MULTIPLIER: f64 = 22.5;

pub fn price_earnings_ratio(close_price: Option<f64>, eps: Option<f64>) -> Option<f64> {
    let (close, eps) = (close_price?, eps?);
    if eps == 0.0 {
        return None;
    }
    finite(close / eps)
}

/// Dividend rate as a percentage of the current price.
pub fn dividend_yield_percent(
    dividend_rate: Option<f64>,
    current_price: Option<f64>,
) -> Option<f64> {
    let price = current_price.filter(|p| *p > 0.0)?;
    finite(dividend_rate? / price * 100.0)
}

pub fn ebitda_estimate(total_revenue: Option<f64>, ebitda_margin: Option<f64>) -> Option<f64> {
    finite(total_revenue? * ebitda_margin?)
}

/// `sqrt(22.5 * eps * book_value)`, defined only for positive inputs.
pub fn graham_intrinsic_value(eps: Option<f64>, book_value: Option<f64>) -> Option<f64> {
    let eps = eps.filter(|v| *v > 0.0)?;
    let book_value = book_value.filter(|v| *v > 0.0)?;
    finite((GRAHAM_MULTIPLIER * eps * book_value).sqrt())
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// A close alongside the (constant) Graham value for the same date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrahamPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub graham: f64,
}

impl Dated for GrahamPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Attach the Graham value as a constant column next to every close.
pub fn graham_series(
    series: &PriceSeries,
    eps: Option<f64>,
    book_value: Option<f64>,
) -> Vec<GrahamPoint> {
    let Some(graham) = graham_intrinsic_value(eps, book_value) else {
        return Vec::new();
    };
    series
        .points()
        .iter()
        .map(|p| GrahamPoint {
            date: p.date,
            close: p.close,
            graham,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    PriceEarnings,
    DividendYield,
    Ebitda,
    Graham,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::PriceEarnings,
        MetricKind::DividendYield,
        MetricKind::Ebitda,
        MetricKind::Graham,
    ];
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::PriceEarnings => "P/E",
            MetricKind::DividendYield => "Dividend Yield",
            MetricKind::Ebitda => "EBITDA",
            MetricKind::Graham => "Graham Value",
        };
        f.write_str(name)
    }
}

/// The four scalar metrics for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FundamentalMetrics {
    pub price_earnings: Option<f64>,
    pub dividend_yield_pct: Option<f64>,
    pub ebitda: Option<f64>,
    pub graham_value: Option<f64>,
}

impl FundamentalMetrics {
    pub fn from_snapshot(
        latest_close: Option<f64>,
        snapshot: Option<&FundamentalSnapshot>,
    ) -> Self {
        let Some(snap) = snapshot else {
            return Self::default();
        };
        Self {
            price_earnings: price_earnings_ratio(latest_close, snap.eps),
            dividend_yield_pct: dividend_yield_percent(snap.dividend_rate, snap.current_price),
            ebitda: ebitda_estimate(snap.total_revenue, snap.ebitda_margin),
            graham_value: graham_intrinsic_value(snap.eps, snap.book_value),
        }
    }

    pub fn get(&self, kind: MetricKind) -> Option<f64> {
        match kind {
            MetricKind::PriceEarnings => self.price_earnings,
            MetricKind::DividendYield => self.dividend_yield_pct,
            MetricKind::Ebitda => self.ebitda,
            MetricKind::Graham => self.graham_value,
        }
    }
}

/// Metrics for each symbol, in selection order.
///
/// P/E uses the latest close of the symbol's loaded series. A symbol with
/// no snapshot or no prices still gets an entry, with the affected
/// metrics absent.
pub fn compute_fundamental_metrics(
    symbols: &[Symbol],
    prices: &PriceTable,
    snapshots: &SymbolMap<FundamentalSnapshot>,
) -> SymbolMap<FundamentalMetrics> {
    symbols
        .iter()
        .map(|symbol| {
            let latest_close = prices.get(symbol).and_then(|s| s.last()).map(|p| p.close);
            let snapshot = snapshots.get(symbol);
            if snapshot.is_none() {
                log::warn!("{symbol}: no fundamentals snapshot, metrics unavailable");
            }
            let metrics = FundamentalMetrics::from_snapshot(latest_close, snapshot);
            for kind in MetricKind::ALL {
                if metrics.get(kind).is_none() {
                    log::debug!("{symbol}: {kind} unavailable");
                }
            }
            (symbol.clone(), metrics)
        })
        .collect()
}

/// Project one metric kind out of the batch.
pub fn metric_map(
    metrics: &SymbolMap<FundamentalMetrics>,
    kind: MetricKind,
) -> SymbolMap<Option<f64>> {
    metrics
        .iter()
        .map(|(symbol, m)| (symbol.clone(), m.get(kind)))
        .collect()
}

/// Close-vs-Graham series per symbol, filtered to `range`.
///
/// Symbols without a Graham value or without prices map to an empty series.
pub fn graham_comparison(
    symbols: &[Symbol],
    prices: &PriceTable,
    snapshots: &SymbolMap<FundamentalSnapshot>,
    range: &DateRange,
) -> SymbolMap<Vec<GrahamPoint>> {
    symbols
        .iter()
        .map(|symbol| {
            let series = match (prices.get(symbol), snapshots.get(symbol)) {
                (Some(series), Some(snap)) => {
                    let full = graham_series(series, snap.eps, snap.book_value);
                    filter_by_date_range(&full, range)
                }
                _ => Vec::new(),
            };
            (symbol.clone(), series)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::PricePoint;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn series(points: &[(u32, f64)]) -> PriceSeries {
        PriceSeries::new(points.iter().map(|(day, c)| PricePoint::new(d(*day), *c)).collect())
    }

    #[test]
    fn pe_divides_close_by_eps() {
        assert_relative_eq!(price_earnings_ratio(Some(30.0), Some(3.0)).unwrap(), 10.0);
        assert_relative_eq!(price_earnings_ratio(Some(30.0), Some(-3.0)).unwrap(), -10.0);
    }

    #[test]
    fn pe_absent_inputs() {
        assert_eq!(price_earnings_ratio(None, Some(3.0)), None);
        assert_eq!(price_earnings_ratio(Some(30.0), None), None);
    }

    #[test]
    fn dividend_yield_as_percent() {
        assert_relative_eq!(dividend_yield_percent(Some(2.0), Some(40.0)).unwrap(), 5.0);
    }

    #[test]
    fn dividend_yield_absent_rate_is_absent() {
        assert_eq!(dividend_yield_percent(None, Some(40.0)), None);
        assert_eq!(dividend_yield_percent(Some(2.0), None), None);
    }

    #[test]
    fn ebitda_needs_both_inputs() {
        assert_relative_eq!(ebitda_estimate(Some(1_000_000.0), Some(0.25)).unwrap(), 250_000.0);
        assert_eq!(ebitda_estimate(Some(1_000_000.0), None), None);
        assert_eq!(ebitda_estimate(None, Some(0.25)), None);
    }

    #[test]
    fn graham_known_value() {
        let value = graham_intrinsic_value(Some(10.0), Some(40.0)).unwrap();
        assert_relative_eq!(value, (22.5f64 * 10.0 * 40.0).sqrt());
        assert_relative_eq!(value, 94.868_329_805, epsilon = 1e-6);
    }

    #[test]
    fn graham_rejects_non_positive_inputs() {
        assert_eq!(graham_intrinsic_value(Some(-5.0), Some(40.0)), None);
        assert_eq!(graham_intrinsic_value(Some(5.0), Some(-40.0)), None);
        assert_eq!(graham_intrinsic_value(Some(-5.0), Some(-40.0)), None);
        assert_eq!(graham_intrinsic_value(Some(0.0), Some(40.0)), None);
        assert_eq!(graham_intrinsic_value(None, Some(40.0)), None);
    }

    #[test]
    fn graham_series_attaches_constant_column() {
        let s = series(&[(1, 80.0), (2, 90.0), (3, 100.0)]);
        let g = graham_series(&s, Some(10.0), Some(40.0));
        assert_eq!(g.len(), 3);
        assert!(g.iter().all(|p| (p.graham - g[0].graham).abs() < f64::EPSILON));
        assert_eq!(g[2].close, 100.0);
        assert_eq!(g[2].date, d(3));
    }

    #[test]
    fn graham_series_empty_cases() {
        let s = series(&[(1, 80.0)]);
        assert!(graham_series(&s, Some(-1.0), Some(40.0)).is_empty());
        assert!(graham_series(&PriceSeries::default(), Some(10.0), Some(40.0)).is_empty());
    }

    #[test]
    fn batch_isolates_missing_fields() {
        let a = Symbol::from("A.SA");
        let b = Symbol::from("B.SA");
        let mut prices = PriceTable::new();
        prices.insert("A.SA", series(&[(1, 20.0)]));
        prices.insert("B.SA", series(&[(1, 50.0)]));

        let mut snaps = SymbolMap::new();
        snaps.insert(
            a.clone(),
            FundamentalSnapshot {
                eps: Some(2.0),
                total_revenue: Some(1000.0),
                ebitda_margin: None,
                ..Default::default()
            },
        );
        snaps.insert(
            b.clone(),
            FundamentalSnapshot {
                eps: Some(5.0),
                total_revenue: Some(2000.0),
                ebitda_margin: Some(0.3),
                ..Default::default()
            },
        );

        let metrics = compute_fundamental_metrics(&[a.clone(), b.clone()], &prices, &snaps);
        assert_eq!(metrics.get(&a).unwrap().ebitda, None);
        assert_relative_eq!(metrics.get(&a).unwrap().price_earnings.unwrap(), 10.0);
        assert_relative_eq!(metrics.get(&b).unwrap().ebitda.unwrap(), 600.0);
        assert_relative_eq!(metrics.get(&b).unwrap().price_earnings.unwrap(), 10.0);
    }

    #[test]
    fn batch_without_snapshot_yields_all_absent() {
        let a = Symbol::from("A.SA");
        let metrics =
            compute_fundamental_metrics(&[a.clone()], &PriceTable::new(), &SymbolMap::new());
        assert_eq!(metrics.get(&a), Some(&FundamentalMetrics::default()));
    }

    #[test]
    fn metric_map_projects_kind() {
        let a = Symbol::from("A.SA");
        let mut metrics = SymbolMap::new();
        metrics.insert(
            a.clone(),
            FundamentalMetrics {
                ebitda: Some(5.0),
                ..Default::default()
            },
        );
        let ebitda = metric_map(&metrics, MetricKind::Ebitda);
        assert_eq!(ebitda.get(&a), Some(&Some(5.0)));
        let pe = metric_map(&metrics, MetricKind::PriceEarnings);
        assert_eq!(pe.get(&a), Some(&None));
    }

    #[test]
    fn graham_comparison_filters_and_keeps_order() {
        let a = Symbol::from("A.SA");
        let b = Symbol::from("B.SA");
        let mut prices = PriceTable::new();
        prices.insert("A.SA", series(&[(1, 20.0), (2, 21.0), (3, 22.0)]));
        prices.insert("B.SA", series(&[(1, 50.0)]));
        let mut snaps = SymbolMap::new();
        snaps.insert(
            a.clone(),
            FundamentalSnapshot {
                eps: Some(2.0),
                book_value: Some(10.0),
                ..Default::default()
            },
        );
        let range = DateRange::new(d(2), d(3)).unwrap();

        let cmp = graham_comparison(&[b.clone(), a.clone()], &prices, &snaps, &range);
        let order: Vec<&Symbol> = cmp.symbols().collect();
        assert_eq!(order, vec![&b, &a]);
        assert!(cmp.get(&b).unwrap().is_empty());
        assert_eq!(cmp.get(&a).unwrap().len(), 2);
    }

    proptest! {
        #[test]
        fn pe_zero_eps_is_absent(close in -1e6f64..1e6) {
            prop_assert_eq!(price_earnings_ratio(Some(close), Some(0.0)), None);
        }

        #[test]
        fn dividend_yield_non_positive_price_is_absent(
            rate in -100f64..100.0,
            price in -1e6f64..=0.0,
        ) {
            prop_assert_eq!(dividend_yield_percent(Some(rate), Some(price)), None);
        }

        #[test]
        fn graham_negative_eps_is_absent(eps in -1e6f64..0.0, bv in -1e6f64..1e6) {
            prop_assert_eq!(graham_intrinsic_value(Some(eps), Some(bv)), None);
        }
    }
}
