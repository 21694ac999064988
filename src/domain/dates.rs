//! Date normalization, date ranges and range filtering.
//!
//! Every date that enters the engine goes through [`NormalizeDate`], which
//! reduces offset-aware timestamps to their local wall-clock date with the
//! offset stripped. After that all comparisons are between plain
//! `NaiveDate`s, so provider data and user selections can arrive in
//! different timezone representations and still compare correctly.

use crate::domain::error::DashboardError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};

/// Single normalization step applied to every date value before comparison.
pub trait NormalizeDate {
    fn normalize_date(&self) -> NaiveDate;
}

impl NormalizeDate for NaiveDate {
    fn normalize_date(&self) -> NaiveDate {
        *self
    }
}

impl NormalizeDate for NaiveDateTime {
    fn normalize_date(&self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> NormalizeDate for DateTime<Tz> {
    fn normalize_date(&self) -> NaiveDate {
        self.naive_local().date()
    }
}

/// Parse a user or file supplied date.
///
/// Accepts RFC 3339 with an offset, `YYYY-MM-DDTHH:MM:SS`,
/// `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DD`.
pub fn parse_date_input(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.normalize_date());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, fmt) {
            return Some(dt.normalize_date());
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}

/// Closed interval `[start, end]` of dates. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: impl NormalizeDate, end: impl NormalizeDate) -> Result<Self, DashboardError> {
        let start = start.normalize_date();
        let end = end.normalize_date();
        if start > end {
            return Err(DashboardError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: &impl NormalizeDate) -> bool {
        let date = date.normalize_date();
        date >= self.start && date <= self.end
    }

    /// Intersect with the bounds of the loaded data. `None` when disjoint.
    pub fn clamp_to(&self, bounds: &DateRange) -> Option<DateRange> {
        let start = self.start.max(bounds.start);
        let end = self.end.min(bounds.end);
        (start <= end).then_some(DateRange { start, end })
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Anything that sits on a (normalized) date axis.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

/// Inclusive sub-sequence of `series` whose dates fall within `range`.
pub fn filter_by_date_range<T: Dated + Clone>(series: &[T], range: &DateRange) -> Vec<T> {
    series
        .iter()
        .filter(|item| range.contains(&item.date()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Obs(NaiveDate);

    impl Dated for Obs {
        fn date(&self) -> NaiveDate {
            self.0
        }
    }

    #[test]
    fn aware_timestamp_keeps_local_wall_clock_date() {
        // 2024-03-01 22:00 at -03:00 is 2024-03-02 01:00 UTC
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();
        let ts = brt.with_ymd_and_hms(2024, 3, 1, 22, 0, 0).unwrap();
        assert_eq!(ts.normalize_date(), d(2024, 3, 1));
    }

    #[test]
    fn naive_and_aware_compare_equal_after_normalization() {
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();
        let aware = brt.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let naive = d(2024, 1, 15).and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(aware.normalize_date(), naive.normalize_date());
    }

    #[test]
    fn parse_accepts_all_supported_forms() {
        assert_eq!(parse_date_input("2024-01-15"), Some(d(2024, 1, 15)));
        assert_eq!(parse_date_input("2024-01-15T10:30:00"), Some(d(2024, 1, 15)));
        assert_eq!(parse_date_input("2024-01-15 10:30:00"), Some(d(2024, 1, 15)));
        assert_eq!(
            parse_date_input("2024-01-15T00:00:00-03:00"),
            Some(d(2024, 1, 15))
        );
        assert_eq!(parse_date_input(" 2024-01-15 "), Some(d(2024, 1, 15)));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_date_input("15/01/2024"), None);
        assert_eq!(parse_date_input(""), None);
    }

    #[test]
    fn range_rejects_inverted_bounds() {
        let result = DateRange::new(d(2024, 2, 1), d(2024, 1, 1));
        assert!(matches!(result, Err(DashboardError::InvalidDateRange { .. })));
    }

    #[test]
    fn range_accepts_single_day() {
        let range = DateRange::new(d(2024, 1, 1), d(2024, 1, 1)).unwrap();
        assert!(range.contains(&d(2024, 1, 1)));
        assert!(!range.contains(&d(2024, 1, 2)));
    }

    #[test]
    fn clamp_to_intersects_bounds() {
        let wanted = DateRange::new(d(2023, 1, 1), d(2024, 6, 30)).unwrap();
        let loaded = DateRange::new(d(2024, 1, 2), d(2024, 12, 30)).unwrap();
        let clamped = wanted.clamp_to(&loaded).unwrap();
        assert_eq!(clamped.start(), d(2024, 1, 2));
        assert_eq!(clamped.end(), d(2024, 6, 30));
    }

    #[test]
    fn clamp_to_disjoint_is_none() {
        let wanted = DateRange::new(d(2020, 1, 1), d(2020, 12, 31)).unwrap();
        let loaded = DateRange::new(d(2024, 1, 1), d(2024, 12, 31)).unwrap();
        assert!(wanted.clamp_to(&loaded).is_none());
    }

    #[test]
    fn filter_is_inclusive_on_both_ends() {
        let series = vec![
            Obs(d(2024, 1, 1)),
            Obs(d(2024, 1, 2)),
            Obs(d(2024, 1, 3)),
            Obs(d(2024, 1, 4)),
        ];
        let range = DateRange::new(d(2024, 1, 2), d(2024, 1, 3)).unwrap();
        let filtered = filter_by_date_range(&series, &range);
        assert_eq!(filtered, vec![Obs(d(2024, 1, 2)), Obs(d(2024, 1, 3))]);
    }

    #[test]
    fn filter_accepts_aware_range_bounds() {
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();
        let series = vec![Obs(d(2024, 1, 1)), Obs(d(2024, 1, 2))];
        let range = DateRange::new(
            brt.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            brt.with_ymd_and_hms(2024, 1, 2, 23, 59, 59).unwrap(),
        )
        .unwrap();
        assert_eq!(filter_by_date_range(&series, &range), vec![Obs(d(2024, 1, 2))]);
    }

    proptest! {
        #[test]
        fn filter_is_idempotent(
            offsets in proptest::collection::vec(0i64..400, 0..60),
            a in 0i64..400,
            b in 0i64..400,
        ) {
            let base = d(2023, 1, 1);
            let mut series: Vec<Obs> = offsets
                .iter()
                .map(|o| Obs(base + chrono::Duration::days(*o)))
                .collect();
            series.sort_by_key(|o| o.0);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let range = DateRange::new(
                base + chrono::Duration::days(lo),
                base + chrono::Duration::days(hi),
            ).unwrap();

            let once = filter_by_date_range(&series, &range);
            let twice = filter_by_date_range(&once, &range);
            prop_assert_eq!(once, twice);
        }
    }
}
