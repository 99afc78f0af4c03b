use crate::domain::report::{
    DashboardReport, HeadlineMetrics, MonthlyTradeRow, ProductAnalysis, ProductTable,
    SimulationResult, ViewType,
};
use crate::utils::format::{format_billions, format_br_thousands, format_percent};
use std::fmt::Write;

/// Rows of the monthly table shown in text mode.
const RECENT_PERIODS: usize = 24;

pub fn render_report(report: &DashboardReport) -> String {
    let mut out = String::new();
    out.push_str(&render_monthly(&report.monthly, report.view));
    out.push('\n');
    if let Some(headline) = &report.headline {
        out.push_str(&render_headline(headline));
        out.push('\n');
    }
    out.push_str(&render_products(&report.products));
    out.push('\n');
    out.push_str(&render_simulation(&report.simulation));
    if let Some(analysis) = &report.product_analysis {
        out.push('\n');
        out.push_str(&render_product_analysis(analysis, report.view));
    }
    out
}

pub fn render_monthly(rows: &[MonthlyTradeRow], view: ViewType) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Trade Balance Brazil-USA {}", view.title_suffix());
    if rows.is_empty() {
        let _ = writeln!(out, "  no trade records loaded");
        return out;
    }

    let _ = writeln!(
        out,
        "{:<8} {:>12} {:>12} {:>12}  (US$ million)",
        "Period", "Exports", "Imports", "Balance"
    );
    let skip = rows.len().saturating_sub(RECENT_PERIODS);
    for row in &rows[skip..] {
        let values = row.view(view);
        let _ = writeln!(
            out,
            "{:<8} {:>12} {:>12} {:>12}",
            row.period.to_string(),
            format_br_thousands(values.exports),
            format_br_thousands(values.imports),
            format_br_thousands(values.balance)
        );
    }
    if skip > 0 {
        let _ = writeln!(out, "  ({} earlier periods omitted)", skip);
    }
    out
}

pub fn render_headline(headline: &HeadlineMetrics) -> String {
    let mut out = String::new();
    let v = &headline.values;
    let _ = writeln!(out, "Latest period {} {}", headline.period, headline.view.title_suffix());
    let _ = writeln!(out, "  Exports:             {}", format_billions(v.exports));
    let _ = writeln!(out, "  Imports:             {}", format_billions(v.imports));
    let _ = writeln!(
        out,
        "  Trade balance:       {} ({})",
        format_billions(v.balance),
        if headline.is_surplus() { "surplus" } else { "deficit" }
    );
    let _ = writeln!(
        out,
        "  Balance % of GDP:    {}",
        format_percent(headline.balance_gdp_percent, 2)
    );
    let _ = writeln!(out, "  Import coverage:     {:.2}x", headline.import_coverage);
    out
}

pub fn render_products(table: &ProductTable) -> String {
    let mut out = String::new();
    match (table.window_start, table.window_end) {
        (Some(start), Some(end)) => {
            let _ = writeln!(
                out,
                "Top {} exported products, {} to {}",
                table.rows.len(),
                start,
                end
            );
        }
        _ => {
            let _ = writeln!(out, "Top exported products");
        }
    }
    let _ = writeln!(out, "{:<60} {:>12} {:>8}", "Product", "US$ million", "Share");
    for row in table.all_rows() {
        let _ = writeln!(
            out,
            "{:<60} {:>12} {:>8}",
            truncate(&row.product_label, 60),
            format_br_thousands(row.value_usd_millions),
            format_percent(row.share_percent, 1)
        );
    }
    let _ = writeln!(
        out,
        "Total: {} across {} products",
        format_billions(table.total_usd_millions),
        table.distinct_products
    );
    out
}

pub fn render_simulation(result: &SimulationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Tariff scenario simulator");
    let _ = writeln!(
        out,
        "{:<50} {:>10} {:>8} {:>8} {:>10}",
        "Product", "US$ Bi", "Share", "Tariff", "Impact Bi"
    );
    for row in &result.rows {
        let _ = writeln!(
            out,
            "{:<50} {:>10.1} {:>8} {:>8} {:>10.2}",
            truncate(&row.product_label, 50),
            row.value_usd_millions / 1000.0,
            format_percent(row.share_percent, 1),
            format_percent(row.tariff_percent, 1),
            row.impact_usd_millions / 1000.0
        );
    }

    let summary = &result.summary;
    let _ = writeln!(
        out,
        "Total exported:          {}",
        format_billions(summary.total_export_usd_millions)
    );
    let _ = writeln!(
        out,
        "Weighted tariff:         {}",
        format_percent(summary.weighted_tariff_percent, 1)
    );
    let _ = writeln!(
        out,
        "Total impact:            US$ {:.2} Bi",
        summary.total_impact_usd_millions / 1000.0
    );
    if let Some(gdp) = summary.impact_gdp_percent {
        let _ = writeln!(out, "Impact % of GDP:         {}", format_percent(gdp, 2));
    }
    out
}

pub fn render_product_analysis(analysis: &ProductAnalysis, view: ViewType) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} of {} ({}) {}",
        analysis.direction,
        analysis.product_label,
        analysis.product_code,
        view.title_suffix()
    );
    let skip = analysis.series.len().saturating_sub(RECENT_PERIODS);
    for row in &analysis.series[skip..] {
        let _ = writeln!(out, "{:<8} {:>12.3} Bi", row.period.to_string(), row.view(view) / 1000.0);
    }
    let _ = writeln!(
        out,
        "Trailing 12M:            US$ {:.1} Bi",
        analysis.trailing_12m_usd_millions / 1000.0
    );
    if let Some(growth) = analysis.yoy_growth_percent {
        let _ = writeln!(out, "12M growth:              {:+.1}%", growth);
    }
    let _ = writeln!(
        out,
        "Monthly average (12M):   US$ {:.2} Bi",
        analysis.average_monthly_12m_usd_millions / 1000.0
    );
    out
}

fn truncate(label: &str, width: usize) -> String {
    if label.chars().count() <= width {
        return label.to_string();
    }
    let mut cut: String = label.chars().take(width.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}
