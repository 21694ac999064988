//! SVG line charts for reports.

use chrono::NaiveDate;
use std::fmt::Write;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 260.0;
const PADDING: f64 = 48.0;
const LEGEND_ROW: f64 = 14.0;

const PALETTE: [&str; 8] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#17becf",
];

/// One labelled line. Points must be ascending by date.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSeries {
    pub label: String,
    pub points: Vec<(NaiveDate, f64)>,
}

impl LineSeries {
    pub fn new(label: impl Into<String>, points: Vec<(NaiveDate, f64)>) -> Self {
        Self {
            label: label.into(),
            points,
        }
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render `series` on shared date and value axes.
///
/// Returns an empty string when there is nothing to plot. X positions are
/// proportional to calendar days, so gaps in one series do not shift the
/// others.
pub fn generate_line_chart_svg(title: &str, series: &[LineSeries]) -> String {
    let all_points = series.iter().flat_map(|s| s.points.iter());
    let (mut min_date, mut max_date) = (None::<NaiveDate>, None::<NaiveDate>);
    let (mut min_value, mut max_value) = (f64::INFINITY, f64::NEG_INFINITY);
    for (date, value) in all_points {
        min_date = Some(min_date.map_or(*date, |d| d.min(*date)));
        max_date = Some(max_date.map_or(*date, |d| d.max(*date)));
        min_value = min_value.min(*value);
        max_value = max_value.max(*value);
    }
    let (Some(min_date), Some(max_date)) = (min_date, max_date) else {
        return String::new();
    };

    let legend_height = LEGEND_ROW * series.len() as f64;
    let height = HEIGHT + legend_height;
    let plot_width = WIDTH - 2.0 * PADDING;
    let plot_height = HEIGHT - 2.0 * PADDING;

    let span_days = (max_date - min_date).num_days();
    let scale_x = if span_days > 0 {
        plot_width / span_days as f64
    } else {
        0.0
    };
    let range = max_value - min_value;
    let scale_y = if range > 0.0 { plot_height / range } else { 1.0 };

    let x_of = |date: NaiveDate| PADDING + (date - min_date).num_days() as f64 * scale_x;
    let y_of = |value: f64| {
        if range > 0.0 {
            HEIGHT - PADDING - (value - min_value) * scale_y
        } else {
            HEIGHT / 2.0
        }
    };

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH:.0}" height="{height:.0}" viewBox="0 0 {WIDTH:.0} {height:.0}" font-family="sans-serif" font-size="11">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="20" font-size="13" font-weight="bold">{}</text>"#,
        PADDING,
        escape_xml(title)
    );

    // Axes
    let _ = writeln!(
        svg,
        r##"<line x1="{PADDING:.1}" y1="{PADDING:.1}" x2="{PADDING:.1}" y2="{:.1}" stroke="#333"/>"##,
        HEIGHT - PADDING
    );
    let _ = writeln!(
        svg,
        r##"<line x1="{PADDING:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="#333"/>"##,
        HEIGHT - PADDING,
        WIDTH - PADDING,
        HEIGHT - PADDING
    );
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="end">{:.2}</text>"#,
        PADDING - 4.0,
        y_of(max_value) + 4.0,
        max_value
    );
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="end">{:.2}</text>"#,
        PADDING - 4.0,
        y_of(min_value) + 4.0,
        min_value
    );
    let _ = writeln!(
        svg,
        r#"<text x="{PADDING:.1}" y="{:.1}">{min_date}</text>"#,
        HEIGHT - PADDING + 16.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="end">{max_date}</text>"#,
        WIDTH - PADDING,
        HEIGHT - PADDING + 16.0
    );

    for (i, line) in series.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        if !line.points.is_empty() {
            let points: Vec<String> = line
                .points
                .iter()
                .map(|(date, value)| format!("{:.1},{:.1}", x_of(*date), y_of(*value)))
                .collect();
            let _ = writeln!(
                svg,
                r#"<polyline fill="none" stroke="{color}" stroke-width="1.5" points="{}"/>"#,
                points.join(" ")
            );
        }

        let legend_y = HEIGHT + LEGEND_ROW * i as f64;
        let _ = writeln!(
            svg,
            r#"<rect x="{PADDING:.1}" y="{:.1}" width="10" height="10" fill="{color}"/>"#,
            legend_y - 9.0
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{legend_y:.1}">{}</text>"#,
            PADDING + 14.0,
            escape_xml(&line.label)
        );
    }

    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(generate_line_chart_svg("Prices", &[]), "");
        let empty = LineSeries::new("PETR4.SA", vec![]);
        assert_eq!(generate_line_chart_svg("Prices", &[empty]), "");
    }

    #[test]
    fn one_polyline_per_non_empty_series() {
        let series = vec![
            LineSeries::new("PETR4.SA", vec![(d(1), 10.0), (d(2), 11.0), (d(5), 12.0)]),
            LineSeries::new("VALE3.SA", vec![(d(2), 60.0), (d(3), 61.0)]),
            LineSeries::new("ITUB4.SA", vec![]),
        ];
        let svg = generate_line_chart_svg("Prices", &series);

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.contains("VALE3.SA"));
        assert!(svg.contains("ITUB4.SA"));
        assert!(svg.contains("2024-01-01"));
        assert!(svg.contains("2024-01-05"));
    }

    #[test]
    fn x_axis_is_proportional_to_days() {
        let series = vec![LineSeries::new("A", vec![(d(1), 1.0), (d(2), 2.0), (d(5), 3.0)])];
        let svg = generate_line_chart_svg("t", &series);
        // Plot width 544 over 4 days: 136 per day.
        assert!(svg.contains("48.0,212.0 184.0,130.0 592.0,48.0"));
    }

    #[test]
    fn flat_series_is_centered() {
        let series = vec![LineSeries::new("A", vec![(d(1), 5.0), (d(2), 5.0)])];
        let svg = generate_line_chart_svg("t", &series);
        assert!(svg.contains("48.0,130.0 592.0,130.0"));
    }

    #[test]
    fn labels_are_escaped() {
        let series = vec![LineSeries::new("A&B <x>", vec![(d(1), 1.0)])];
        let svg = generate_line_chart_svg("P/E & more", &series);
        assert!(svg.contains("A&amp;B &lt;x&gt;"));
        assert!(svg.contains("P/E &amp; more"));
    }
}
