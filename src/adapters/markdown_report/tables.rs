//! Markdown formatting for metric cards and performance lines.

use crate::domain::performance::{format_percent, PortfolioPerformance, Sign};
use crate::domain::symbol::SymbolMap;
use crate::domain::valuation::MetricKind;

pub const NOT_AVAILABLE: &str = "N/A";

/// `1234567.891` → `1,234,567.89`
pub fn format_amount(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

/// Card text for one metric value. Absent values render as `N/A`.
pub fn format_metric(kind: MetricKind, value: Option<f64>) -> String {
    match value {
        None => NOT_AVAILABLE.to_string(),
        Some(v) => match kind {
            MetricKind::PriceEarnings => format!("{:.2}", v),
            MetricKind::DividendYield => format!("{:.2}%", v),
            MetricKind::Ebitda | MetricKind::Graham => format_amount(v),
        },
    }
}

pub fn sign_label(sign: Sign) -> &'static str {
    match sign {
        Sign::Positive => "(up)",
        Sign::Negative => "(down)",
        Sign::Zero => "(flat)",
    }
}

fn format_return(value: Option<f64>) -> String {
    match value {
        Some(r) => format!("{} {}", format_percent(r), sign_label(Sign::of(r))),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// One table row per metric card, in selection order.
pub fn render_metric_cards(kind: MetricKind, cards: &SymbolMap<Option<f64>>) -> String {
    if cards.is_empty() {
        return "_No symbols selected._\n".to_string();
    }
    let mut out = format!("| Symbol | {} |\n|---|---:|\n", kind);
    for (symbol, value) in cards.iter() {
        out.push_str(&format!("| {} | {} |\n", symbol, format_metric(kind, *value)));
    }
    out
}

pub fn render_performance(performance: &PortfolioPerformance) -> String {
    let mut out = String::from("| Symbol | Return | Final value |\n|---|---:|---:|\n");
    let finals = performance.final_values();
    for (symbol, r) in performance.per_symbol.iter() {
        let final_value = finals
            .get(symbol)
            .copied()
            .flatten()
            .map(format_amount)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            symbol,
            format_return(*r),
            final_value
        ));
    }

    out.push_str(&format!(
        "\nPortfolio performance across {} of {} symbols: **{}**\n",
        performance.contributing(),
        performance.per_symbol.len(),
        format_return(performance.aggregate)
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::performance::PortfolioAllocation;
    use crate::domain::symbol::Symbol;

    #[test]
    fn amount_groups_thousands() {
        assert_eq!(format_amount(225_000_000_000.0), "225,000,000,000.00");
        assert_eq!(format_amount(1234.5), "1,234.50");
        assert_eq!(format_amount(999.999), "1,000.00");
        assert_eq!(format_amount(-1234567.891), "-1,234,567.89");
        assert_eq!(format_amount(0.0), "0.00");
    }

    #[test]
    fn metric_formats_per_kind() {
        assert_eq!(format_metric(MetricKind::PriceEarnings, Some(5.1333)), "5.13");
        assert_eq!(format_metric(MetricKind::DividendYield, Some(10.909)), "10.91%");
        assert_eq!(format_metric(MetricKind::Ebitda, Some(2500.0)), "2,500.00");
        assert_eq!(format_metric(MetricKind::Graham, None), "N/A");
    }

    #[test]
    fn metric_cards_keep_selection_order() {
        let cards: SymbolMap<Option<f64>> = [
            (Symbol::from("VALE3.SA"), Some(6.0)),
            (Symbol::from("PETR4.SA"), None),
        ]
        .into_iter()
        .collect();
        let table = render_metric_cards(MetricKind::PriceEarnings, &cards);
        let vale = table.find("VALE3.SA").unwrap();
        let petr = table.find("PETR4.SA").unwrap();
        assert!(vale < petr);
        assert!(table.contains("| PETR4.SA | N/A |"));
        assert!(table.contains("| Symbol | P/E |"));
    }

    #[test]
    fn performance_rows_carry_sign_labels() {
        let a = Symbol::from("A.SA");
        let b = Symbol::from("B.SA");
        let c = Symbol::from("C.SA");
        let performance = PortfolioPerformance {
            allocation: PortfolioAllocation::equal_weight(
                &[a.clone(), b.clone(), c.clone()],
                1000.0,
            ),
            per_symbol: [(a, Some(0.5)), (b, Some(-0.1)), (c, None)].into_iter().collect(),
            aggregate: Some(0.2),
        };
        let out = render_performance(&performance);
        assert!(out.contains("| A.SA | 50.00% (up) | 1,500.00 |"));
        assert!(out.contains("| B.SA | -10.00% (down) | 900.00 |"));
        assert!(out.contains("| C.SA | N/A | N/A |"));
        assert!(out.contains("across 2 of 3 symbols: **20.00% (up)**"));
    }

    #[test]
    fn flat_return_is_labelled_flat() {
        assert_eq!(format_return(Some(0.0)), "0.00% (flat)");
    }
}
