//! Yahoo Finance gateway over the public chart and quoteSummary endpoints.
//!
//! quoteSummary only answers requests that carry a session cookie and a
//! matching crumb. The adapter visits the cookie endpoint once, fetches a
//! crumb, caches it, and refreshes it when Yahoo answers 401 or 403.
//!
//! Responses are parsed by [`parse_chart`] and [`parse_quote_summary`],
//! which take the raw body so they can be tested without a network.

use crate::domain::error::DashboardError;
use crate::domain::fundamentals::{FundamentalField as F, FundamentalSnapshot};
use crate::domain::price::{PricePoint, PriceSeries};
use crate::domain::symbol::Symbol;
use crate::ports::data_port::MarketDataPort;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use reqwest::StatusCode;
use reqwest::header::REFERER;
use serde::Deserialize;
use std::cell::RefCell;
use std::time::Duration;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const SUMMARY_MODULES: &str = "defaultKeyStatistics,financialData,summaryDetail";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) equidash";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URLS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
];
const REFERER_URL: &str = "https://finance.yahoo.com/";

// `chart` schema
#[derive(Deserialize, Debug)]
struct ChartEnvelope {
    chart: ChartResponse,
}

#[derive(Deserialize, Debug)]
struct ChartResponse {
    result: Option<Vec<ChartResult>>,
    error: Option<ApiError>,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Deserialize, Debug, Default)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i32,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    code: Option<String>,
    description: Option<String>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.code.as_deref().unwrap_or("error"),
            self.description.as_deref().unwrap_or("no description")
        )
    }
}

// `quoteSummary` schema
#[derive(Deserialize, Debug)]
struct SummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryResponse,
}

#[derive(Deserialize, Debug)]
struct SummaryResponse {
    result: Option<Vec<SummaryResult>>,
    error: Option<ApiError>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct SummaryResult {
    #[serde(default)]
    default_key_statistics: KeyStatistics,
    #[serde(default)]
    financial_data: FinancialData,
    #[serde(default)]
    summary_detail: SummaryDetail,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    #[serde(default)]
    trailing_eps: Option<RawValue>,
    #[serde(default)]
    book_value: Option<RawValue>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct FinancialData {
    #[serde(default)]
    current_price: Option<RawValue>,
    #[serde(default)]
    total_revenue: Option<RawValue>,
    #[serde(default)]
    ebitda_margins: Option<RawValue>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    #[serde(default)]
    dividend_rate: Option<RawValue>,
}

/// Yahoo wraps numbers as `{"raw": 1.5, "fmt": "1.50"}`. An absent value
/// shows up as `{}`, as `null`, or not at all.
#[derive(Deserialize, Debug, Default)]
struct RawValue {
    raw: Option<f64>,
}

fn raw(value: &Option<RawValue>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw)
}

/// Daily closes from a chart response.
///
/// Timestamps are shifted into the exchange's own offset before they are
/// reduced to a date. Null closes are dropped.
pub fn parse_chart(symbol: &Symbol, body: &str) -> Result<PriceSeries, DashboardError> {
    let envelope: ChartEnvelope = serde_json::from_str(body).map_err(|e| {
        DashboardError::fetch(symbol.as_str(), format!("invalid chart response: {e}"))
    })?;

    if let Some(error) = envelope.chart.error {
        return Err(DashboardError::fetch(symbol.as_str(), error));
    }
    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        log::warn!("[{symbol}] chart response has no result; treating as empty");
        return Ok(PriceSeries::default());
    };

    let offset = FixedOffset::east_opt(result.meta.gmtoffset).ok_or_else(|| {
        DashboardError::fetch(
            symbol.as_str(),
            format!("invalid gmtoffset {}", result.meta.gmtoffset),
        )
    })?;
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let mut points = Vec::with_capacity(closes.len());
    for (timestamp, close) in result.timestamp.iter().zip(closes) {
        let Some(close) = close else { continue };
        let Some(instant) = DateTime::from_timestamp(*timestamp, 0) else {
            log::warn!("[{symbol}] skipping out-of-range timestamp {timestamp}");
            continue;
        };
        points.push(PricePoint::new(instant.with_timezone(&offset), close));
    }

    Ok(PriceSeries::new(points))
}

/// Fundamentals snapshot from a quoteSummary response. Missing modules and
/// fields stay absent.
pub fn parse_quote_summary(
    symbol: &Symbol,
    body: &str,
) -> Result<FundamentalSnapshot, DashboardError> {
    let envelope: SummaryEnvelope = serde_json::from_str(body).map_err(|e| {
        DashboardError::fetch(symbol.as_str(), format!("invalid quoteSummary response: {e}"))
    })?;

    if let Some(error) = envelope.quote_summary.error {
        return Err(DashboardError::fetch(symbol.as_str(), error));
    }
    let result = envelope
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| DashboardError::fetch(symbol.as_str(), "quoteSummary has no result"))?;

    let stats = &result.default_key_statistics;
    let financial = &result.financial_data;
    let mut snapshot = FundamentalSnapshot::default();
    snapshot.set(F::Eps, raw(&stats.trailing_eps));
    snapshot.set(F::BookValue, raw(&stats.book_value));
    snapshot.set(F::DividendRate, raw(&result.summary_detail.dividend_rate));
    snapshot.set(F::CurrentPrice, raw(&financial.current_price));
    snapshot.set(F::TotalRevenue, raw(&financial.total_revenue));
    snapshot.set(F::EbitdaMargin, raw(&financial.ebitda_margins));
    Ok(snapshot)
}

/// What a getcrumb body turned out to be.
#[derive(Debug, PartialEq)]
enum CrumbBody {
    Crumb(String),
    RateLimited,
    Invalid,
}

/// A crumb is a short token without whitespace. Error pages come back as
/// HTML or as a plain "Too Many Requests".
fn parse_crumb(body: &str) -> CrumbBody {
    let body = body.trim();
    if body.to_ascii_lowercase().contains("too many requests") {
        return CrumbBody::RateLimited;
    }
    if body.is_empty()
        || body.len() >= 100
        || body.contains(char::is_whitespace)
        || body.contains("<html")
        || body.contains("<!DOCTYPE")
    {
        return CrumbBody::Invalid;
    }
    CrumbBody::Crumb(body.to_string())
}

fn is_auth_rejection(status: Option<StatusCode>) -> bool {
    status.is_some_and(|s| s == StatusCode::UNAUTHORIZED || s == StatusCode::FORBIDDEN)
}

fn unix_start_of(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

pub struct YahooAdapter {
    client: reqwest::blocking::Client,
    crumb: RefCell<Option<String>>,
}

impl YahooAdapter {
    pub fn new(timeout: Duration) -> Result<Self, DashboardError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| DashboardError::ConfigInvalid {
                section: "data".to_string(),
                key: "provider".to_string(),
                reason: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            crumb: RefCell::new(None),
        })
    }

    fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, reqwest::Error> {
        self.client
            .get(url)
            .query(query)
            .header(REFERER, REFERER_URL)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
    }

    fn get(&self, symbol: &Symbol, url: &str) -> Result<String, DashboardError> {
        log::debug!("[{symbol}] GET {url}");
        self.get_text(url, &[]).map_err(|e| DashboardError::fetch(symbol.as_str(), e))
    }

    /// Cached crumb, or a fresh one bound to the session cookie.
    fn crumb(&self, symbol: &Symbol) -> Result<String, DashboardError> {
        if let Some(crumb) = self.crumb.borrow().clone() {
            return Ok(crumb);
        }

        log::debug!("[{symbol}] fetching Yahoo session cookie");
        // Only the Set-Cookie headers matter here, not the status.
        self.client
            .get(COOKIE_URL)
            .header(REFERER, REFERER_URL)
            .send()
            .map_err(|e| {
                DashboardError::fetch(symbol.as_str(), format!("failed to fetch Yahoo cookie: {e}"))
            })?;

        for url in CRUMB_URLS {
            let body = match self.get_text(url, &[]) {
                Ok(body) => body,
                Err(e) => {
                    log::debug!("[{symbol}] {url}: {e}");
                    continue;
                }
            };
            match parse_crumb(&body) {
                CrumbBody::Crumb(crumb) => {
                    self.crumb.replace(Some(crumb.clone()));
                    return Ok(crumb);
                }
                CrumbBody::RateLimited => {
                    return Err(DashboardError::fetch(
                        symbol.as_str(),
                        "Yahoo rate limited the crumb request",
                    ));
                }
                CrumbBody::Invalid => log::debug!("[{symbol}] {url}: unusable crumb body"),
            }
        }
        Err(DashboardError::fetch(symbol.as_str(), "failed to obtain a Yahoo crumb"))
    }

    fn get_summary(&self, symbol: &Symbol, crumb: &str) -> Result<String, reqwest::Error> {
        let url = format!("{QUOTE_SUMMARY_URL}/{symbol}");
        log::debug!("[{symbol}] GET {url}");
        self.get_text(&url, &[("modules", SUMMARY_MODULES), ("crumb", crumb)])
    }
}

impl MarketDataPort for YahooAdapter {
    fn fetch_price_series(
        &self,
        symbol: &Symbol,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, DashboardError> {
        let period1 = unix_start_of(start_date);
        let period2 = unix_start_of(end_date.succ_opt().unwrap_or(end_date));
        let url = format!("{CHART_URL}/{symbol}?period1={period1}&period2={period2}&interval=1d");

        let series = parse_chart(symbol, &self.get(symbol, &url)?)?;
        let points = series
            .points()
            .iter()
            .filter(|p| p.date >= start_date && p.date <= end_date)
            .copied()
            .collect();
        Ok(PriceSeries::new(points))
    }

    fn fetch_snapshot(&self, symbol: &Symbol) -> Result<FundamentalSnapshot, DashboardError> {
        let crumb = self.crumb(symbol)?;
        let body = match self.get_summary(symbol, &crumb) {
            Err(e) if is_auth_rejection(e.status()) => {
                log::warn!("[{symbol}] Yahoo rejected the crumb, refreshing session");
                self.crumb.replace(None);
                let crumb = self.crumb(symbol)?;
                self.get_summary(symbol, &crumb)
            }
            other => other,
        }
        .map_err(|e| DashboardError::fetch(symbol.as_str(), e))?;
        parse_quote_summary(symbol, &body)
    }
}
