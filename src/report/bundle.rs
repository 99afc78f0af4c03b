use crate::domain::model::Direction;
use crate::domain::report::{DashboardReport, HeadlineMetrics, SimulationSummary, ViewType};
use crate::utils::error::{Result, TradeError};
use serde::Serialize;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const MONTHLY_FILE: &str = "monthly.csv";
pub const PRODUCTS_FILE: &str = "products.csv";
pub const SIMULATION_FILE: &str = "simulation.csv";
pub const SUMMARY_FILE: &str = "summary.json";
pub const PRODUCT_FILE: &str = "product.csv";

#[derive(Serialize)]
struct MonthlyCsvRow {
    period: String,
    exports: f64,
    imports: f64,
    balance: f64,
    exports_12m: f64,
    imports_12m: f64,
    balance_12m: f64,
    exports_sa: f64,
    imports_sa: f64,
    balance_sa: f64,
    exports_3mma: f64,
    imports_3mma: f64,
    balance_3mma: f64,
}

#[derive(Serialize)]
struct Summary<'a> {
    view: ViewType,
    record_count: usize,
    headline: &'a Option<HeadlineMetrics>,
    simulation: &'a SimulationSummary,
    product: Option<ProductSummary<'a>>,
}

#[derive(Serialize)]
struct ProductSummary<'a> {
    product_code: &'a str,
    product_label: &'a str,
    direction: Direction,
    trailing_12m_usd_millions: f64,
    yoy_growth_percent: Option<f64>,
    average_monthly_12m_usd_millions: f64,
}

/// Packs the report tables into a ZIP archive held in memory.
pub fn build_bundle(report: &DashboardReport) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    zip.start_file::<_, ()>(MONTHLY_FILE, FileOptions::default())?;
    zip.write_all(&monthly_csv(report)?)?;

    zip.start_file::<_, ()>(PRODUCTS_FILE, FileOptions::default())?;
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in report.products.all_rows() {
        writer.serialize(row)?;
    }
    zip.write_all(&into_bytes(writer)?)?;

    zip.start_file::<_, ()>(SIMULATION_FILE, FileOptions::default())?;
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in &report.simulation.rows {
        writer.serialize(row)?;
    }
    zip.write_all(&into_bytes(writer)?)?;

    if let Some(analysis) = &report.product_analysis {
        zip.start_file::<_, ()>(PRODUCT_FILE, FileOptions::default())?;
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in &analysis.series {
            writer.serialize(row)?;
        }
        zip.write_all(&into_bytes(writer)?)?;
    }

    zip.start_file::<_, ()>(SUMMARY_FILE, FileOptions::default())?;
    let summary = Summary {
        view: report.view,
        record_count: report.record_count,
        headline: &report.headline,
        simulation: &report.simulation.summary,
        product: report.product_analysis.as_ref().map(|a| ProductSummary {
            product_code: &a.product_code,
            product_label: &a.product_label,
            direction: a.direction,
            trailing_12m_usd_millions: a.trailing_12m_usd_millions,
            yoy_growth_percent: a.yoy_growth_percent,
            average_monthly_12m_usd_millions: a.average_monthly_12m_usd_millions,
        }),
    };
    zip.write_all(serde_json::to_string_pretty(&summary)?.as_bytes())?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn monthly_csv(report: &DashboardReport) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in &report.monthly {
        writer.serialize(MonthlyCsvRow {
            period: row.period.to_string(),
            exports: row.monthly.exports,
            imports: row.monthly.imports,
            balance: row.monthly.balance,
            exports_12m: row.rolling_12m.exports,
            imports_12m: row.rolling_12m.imports,
            balance_12m: row.rolling_12m.balance,
            exports_sa: row.seasonally_adjusted.exports,
            imports_sa: row.seasonally_adjusted.imports,
            balance_sa: row.seasonally_adjusted.balance,
            exports_3mma: row.three_month_average.exports,
            imports_3mma: row.three_month_average.imports,
            balance_3mma: row.three_month_average.balance,
        })?;
    }
    into_bytes(writer)
}

fn into_bytes(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| TradeError::IoError(e.into_error()))
}
