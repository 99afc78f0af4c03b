// Derived tables produced by the aggregation and simulation stages.

use crate::domain::model::{Direction, Period};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    pub product_code: String,
    pub period: Period,
    pub direction: Direction,
}

/// Summed USD millions per (product, period, direction).
pub type AggregatedSeries = BTreeMap<SeriesKey, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewType {
    #[default]
    #[serde(rename = "12m", alias = "rolling-12m")]
    Rolling12M,
    #[serde(rename = "sa", alias = "seasonally-adjusted")]
    SeasonallyAdjusted,
    #[serde(rename = "3mma", alias = "three-month-average")]
    ThreeMonthAverage,
}

impl ViewType {
    pub fn title_suffix(&self) -> &'static str {
        match self {
            ViewType::Rolling12M => "(12M rolling sum)",
            ViewType::SeasonallyAdjusted => "(monthly SA annualized)",
            ViewType::ThreeMonthAverage => "(3MMA SA annualized)",
        }
    }
}

impl FromStr for ViewType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "12m" | "rolling-12m" => Ok(ViewType::Rolling12M),
            "sa" | "seasonally-adjusted" => Ok(ViewType::SeasonallyAdjusted),
            "3mma" | "three-month-average" => Ok(ViewType::ThreeMonthAverage),
            other => Err(format!("unknown view '{}', expected 12m, sa or 3mma", other)),
        }
    }
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViewType::Rolling12M => "12m",
            ViewType::SeasonallyAdjusted => "sa",
            ViewType::ThreeMonthAverage => "3mma",
        })
    }
}

/// Exports, imports and balance for one view of one period.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowValues {
    pub exports: f64,
    pub imports: f64,
    pub balance: f64,
}

impl FlowValues {
    pub fn new(exports: f64, imports: f64) -> Self {
        Self {
            exports,
            imports,
            balance: exports - imports,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTradeRow {
    pub period: Period,
    pub monthly: FlowValues,
    pub rolling_12m: FlowValues,
    pub seasonally_adjusted: FlowValues,
    pub three_month_average: FlowValues,
}

impl MonthlyTradeRow {
    pub fn view(&self, view: ViewType) -> FlowValues {
        match view {
            ViewType::Rolling12M => self.rolling_12m,
            ViewType::SeasonallyAdjusted => self.seasonally_adjusted,
            ViewType::ThreeMonthAverage => self.three_month_average,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlineMetrics {
    pub period: Period,
    pub view: ViewType,
    pub values: FlowValues,
    pub balance_gdp_percent: f64,
    pub import_coverage: f64,
}

impl HeadlineMetrics {
    pub fn is_surplus(&self) -> bool {
        self.values.balance >= 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductShare {
    pub product_code: String,
    pub product_label: String,
    pub value_usd_millions: f64,
    pub share_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductTable {
    pub window_start: Option<Period>,
    pub window_end: Option<Period>,
    pub total_usd_millions: f64,
    pub distinct_products: usize,
    pub rows: Vec<ProductShare>,
    pub others: ProductShare,
}

impl ProductTable {
    /// Ranked rows followed by the "Others" row.
    pub fn all_rows(&self) -> impl Iterator<Item = &ProductShare> {
        self.rows.iter().chain(std::iter::once(&self.others))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRow {
    pub product_code: String,
    pub product_label: String,
    pub value_usd_millions: f64,
    pub share_percent: f64,
    pub tariff_percent: f64,
    pub impact_usd_millions: f64,
    pub adjusted_value_usd_millions: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub total_export_usd_millions: f64,
    pub weighted_tariff_percent: f64,
    pub total_impact_usd_millions: f64,
    pub impact_gdp_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub rows: Vec<SimulationRow>,
    pub summary: SimulationSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSeriesRow {
    pub period: Period,
    pub value: f64,
    pub rolling_12m: f64,
    pub seasonally_adjusted: f64,
    pub three_month_average: f64,
}

impl ProductSeriesRow {
    pub fn view(&self, view: ViewType) -> f64 {
        match view {
            ViewType::Rolling12M => self.rolling_12m,
            ViewType::SeasonallyAdjusted => self.seasonally_adjusted,
            ViewType::ThreeMonthAverage => self.three_month_average,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAnalysis {
    pub product_code: String,
    pub product_label: String,
    pub direction: Direction,
    pub series: Vec<ProductSeriesRow>,
    pub trailing_12m_usd_millions: f64,
    pub yoy_growth_percent: Option<f64>,
    pub average_monthly_12m_usd_millions: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub view: ViewType,
    pub record_count: usize,
    pub monthly: Vec<MonthlyTradeRow>,
    pub headline: Option<HeadlineMetrics>,
    pub products: ProductTable,
    pub simulation: SimulationResult,
    pub product_analysis: Option<ProductAnalysis>,
}
