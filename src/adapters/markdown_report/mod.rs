//! Markdown report adapter implementing ReportPort.
//!
//! The report is a single `.md` file. Each chart is written next to it as
//! `<stem>-<name>.svg` and linked by relative path, so the directory can be
//! opened in any Markdown viewer.

pub mod chart_svg;
pub mod tables;

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::dashboard::{FundamentalsDashboard, PriceDashboard};
use crate::domain::error::DashboardError;
use crate::domain::price::PriceTable;
use crate::domain::symbol::Symbol;
use crate::domain::valuation::{GrahamPoint, MetricKind};
use crate::ports::report_port::ReportPort;
use chart_svg::{generate_line_chart_svg, LineSeries};

pub struct MarkdownReportAdapter {
    charts: bool,
}

impl MarkdownReportAdapter {
    pub fn new() -> Self {
        Self { charts: true }
    }

    /// Tables only; no SVG files are written.
    pub fn without_charts() -> Self {
        Self { charts: false }
    }

    /// Write `svg` next to `output_path` and return a Markdown image link,
    /// or `fallback` when there is nothing to draw.
    fn chart(
        &self,
        output_path: &Path,
        name: &str,
        title: &str,
        svg: String,
        fallback: &str,
    ) -> Result<String, DashboardError> {
        if svg.is_empty() {
            return Ok(format!("> {fallback}\n"));
        }
        if !self.charts {
            return Ok(String::new());
        }
        let file = chart_path(output_path, name);
        fs::write(&file, svg)?;
        let link = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(format!("![{title}]({link})\n"))
    }

    fn price_chart(
        &self,
        output_path: &Path,
        prices: &PriceTable,
    ) -> Result<String, DashboardError> {
        let svg = generate_line_chart_svg("Price evolution", &price_lines(prices));
        self.chart(
            output_path,
            "prices",
            "Price evolution",
            svg,
            "No price data in the selected range.",
        )
    }
}

impl Default for MarkdownReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn chart_path(output_path: &Path, name: &str) -> PathBuf {
    let stem = output_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    let name: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    output_path.with_file_name(format!("{stem}-{name}.svg"))
}

fn price_lines(prices: &PriceTable) -> Vec<LineSeries> {
    prices
        .columns()
        .iter()
        .map(|c| {
            LineSeries::new(
                c.label.clone(),
                c.series.points().iter().map(|p| (p.date, p.close)).collect(),
            )
        })
        .collect()
}

fn graham_lines(points: &[GrahamPoint]) -> Vec<LineSeries> {
    vec![
        LineSeries::new("Close", points.iter().map(|p| (p.date, p.close)).collect()),
        LineSeries::new("Graham", points.iter().map(|p| (p.date, p.graham)).collect()),
    ]
}

fn header(title: &str, symbols: &[Symbol], range: &impl std::fmt::Display) -> String {
    let list: Vec<&str> = symbols.iter().map(Symbol::as_str).collect();
    format!(
        "# {title}\n\n- Period: {range}\n- Symbols: {}\n\n",
        list.join(", ")
    )
}

fn write_report(output_path: &Path, content: &str) -> Result<(), DashboardError> {
    fs::write(output_path, content)?;
    log::info!("report written to {}", output_path.display());
    Ok(())
}

fn ensure_parent(output_path: &Path) -> Result<(), DashboardError> {
    match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(fs::create_dir_all(parent)?),
        _ => Ok(()),
    }
}

const METRIC_NOTES: [(MetricKind, &str, &str); 3] = [
    (
        MetricKind::PriceEarnings,
        "P/E (Price / Earnings)",
        "A high P/E suggests the market is willing to pay more for each unit of earnings, usually on growth expectations.",
    ),
    (
        MetricKind::DividendYield,
        "Dividend Yield",
        "Annual dividend per share as a percentage of the current share price.",
    ),
    (
        MetricKind::Ebitda,
        "EBITDA",
        "Earnings before interest, taxes, depreciation and amortization, estimated as total revenue times EBITDA margin.",
    ),
];

impl ReportPort for MarkdownReportAdapter {
    fn write_prices(
        &self,
        dashboard: &PriceDashboard,
        output_path: &Path,
    ) -> Result<(), DashboardError> {
        ensure_parent(output_path)?;

        let mut md = header("Stock Price Dashboard", &dashboard.symbols, &dashboard.range);
        md.push_str("## Price evolution\n\n");
        md.push_str(&self.price_chart(output_path, &dashboard.prices)?);

        md.push_str("\n## Performance\n\n");
        md.push_str(&format!(
            "Equal-weight allocation of {} per symbol.\n\n",
            tables::format_amount(dashboard.performance.allocation.initial_per_symbol)
        ));
        md.push_str(&tables::render_performance(&dashboard.performance));

        write_report(output_path, &md)
    }

    fn write_fundamentals(
        &self,
        dashboard: &FundamentalsDashboard,
        output_path: &Path,
    ) -> Result<(), DashboardError> {
        ensure_parent(output_path)?;

        let mut md = header("Fundamental Indicators", &dashboard.symbols, &dashboard.range);
        md.push_str("## Price evolution\n\n");
        md.push_str(&self.price_chart(output_path, &dashboard.prices)?);

        for (kind, title, note) in METRIC_NOTES {
            md.push_str(&format!("\n## {title}\n\n_{note}_\n\n"));
            md.push_str(&tables::render_metric_cards(kind, &dashboard.metric_cards(kind)));
        }

        md.push_str("\n## Graham Method\n\n");
        md.push_str(
            "_Intrinsic value sqrt(22.5 x EPS x book value per share). A close above the line suggests overvaluation, below it undervaluation._\n\n",
        );
        md.push_str(&tables::render_metric_cards(
            MetricKind::Graham,
            &dashboard.metric_cards(MetricKind::Graham),
        ));
        for symbol in &dashboard.symbols {
            let points = dashboard.graham.get(symbol).map(Vec::as_slice).unwrap_or(&[]);
            md.push_str(&format!("\n### {symbol}\n\n"));
            let title = format!("{symbol}: close vs Graham");
            let svg = generate_line_chart_svg(&title, &graham_lines(points));
            md.push_str(&self.chart(
                output_path,
                &format!("graham-{symbol}"),
                &format!("{symbol} close vs Graham value"),
                svg,
                &format!("Warning: not enough data for {symbol}."),
            )?);
        }

        write_report(output_path, &md)
    }
}
