//! Plain-text rendering for the terminal.

use std::fmt::Write as _;

use itertools::Itertools;

use crate::{
    data::format_number,
    frame::Table,
    metrics::SummaryMetrics,
};

pub const CURRENCY_SYMBOL: &str = "₦";

/// Left-aligned columns separated by two spaces, with a dashed rule under the
/// header.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|h| h.chars().count().max(3))
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(flatten(cell).chars().count());
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_line(headers.iter().cloned(), &widths));
    let rule = widths.iter().map(|w| "-".repeat(*w));
    let _ = writeln!(output, "{}", format_line(rule, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_line(row.iter().map(|c| flatten(c)), &widths));
    }
    output
}

fn format_line<I: Iterator<Item = String>>(cells: I, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| format!("{:<w$}", cell, w = *width))
        .join("  ")
        .trim_end()
        .to_string()
}

fn flatten(value: &str) -> String {
    value.replace(['\n', '\r', '\t'], " ")
}

/// First `limit` rows of `table` as a rendered grid.
pub fn render_preview(table: &Table, limit: usize) -> String {
    let rows = table
        .rows()
        .take(limit)
        .map(|row| row.iter().map(|cell| cell.as_display()).collect())
        .collect::<Vec<Vec<String>>>();
    render_table(&table.headers(), &rows)
}

/// `1234567.891` → `₦1,234,567.89`
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let grouped = whole
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .join(",");
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{CURRENCY_SYMBOL}{grouped}.{fraction}")
}

pub fn render_metrics(metrics: &SummaryMetrics) -> String {
    let mut output = String::new();
    let summary = vec![
        vec!["Total Sales".to_string(), format_currency(metrics.total_sales)],
        vec!["Total Orders".to_string(), metrics.order_count.to_string()],
        vec!["Top Item".to_string(), metrics.top_item.key.clone()],
        vec!["Top Performing Branch".to_string(), metrics.top_branch.key.clone()],
        vec!["Top Sales Region".to_string(), metrics.top_region.key.clone()],
        vec![
            "Average Order Value".to_string(),
            format_currency(metrics.average_order_value),
        ],
    ];
    output.push_str(&render_table(
        &["metric".to_string(), "value".to_string()],
        &summary,
    ));

    output.push('\n');
    let _ = writeln!(output, "Monthly Sales Trend");
    let monthly = metrics
        .monthly_sales
        .iter()
        .map(|m| vec![m.month.clone(), format_number(m.total)])
        .collect::<Vec<_>>();
    output.push_str(&render_table(
        &["month".to_string(), "total".to_string()],
        &monthly,
    ));
    output
}
