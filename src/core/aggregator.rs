use crate::core::series;
use crate::domain::model::{Period, TradeRecord};
use crate::domain::report::{
    AggregatedSeries, FlowValues, HeadlineMetrics, MonthlyTradeRow, SeriesKey, ViewType,
};
use crate::utils::error::{Result, TradeError};
use std::collections::BTreeMap;

/// Sums record values per (product, period, direction).
pub fn aggregate(records: &[TradeRecord]) -> AggregatedSeries {
    let mut series = AggregatedSeries::new();
    for record in records {
        let key = SeriesKey {
            product_code: record.product_code.clone(),
            period: record.period,
            direction: record.direction,
        };
        *series.entry(key).or_insert(0.0) += record.value_usd_millions;
    }
    series
}

pub fn totals_by_period<'a, I>(records: I) -> BTreeMap<Period, f64>
where
    I: IntoIterator<Item = &'a TradeRecord>,
{
    let mut totals = BTreeMap::new();
    for record in records {
        *totals.entry(record.period).or_insert(0.0) += record.value_usd_millions;
    }
    totals
}

/// Sums per product code for records with `period >= since`.
pub fn totals_by_product(records: &[TradeRecord], since: Option<Period>) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for record in records
        .iter()
        .filter(|r| since.map_or(true, |start| r.period >= start))
    {
        *totals.entry(record.product_code.clone()).or_insert(0.0) += record.value_usd_millions;
    }
    totals
}

/// Monthly exports/imports joined on period, with the derived views.
///
/// A period present on only one side counts zero for the other.
pub fn monthly_trade(
    exports: &[TradeRecord],
    imports: &[TradeRecord],
    seasonal_min_periods: usize,
) -> Vec<MonthlyTradeRow> {
    let export_totals = totals_by_period(exports);
    let import_totals = totals_by_period(imports);

    let mut periods: Vec<Period> = export_totals
        .keys()
        .chain(import_totals.keys())
        .copied()
        .collect();
    periods.sort();
    periods.dedup();

    let exp: Vec<f64> = periods
        .iter()
        .map(|p| export_totals.get(p).copied().unwrap_or(0.0))
        .collect();
    let imp: Vec<f64> = periods
        .iter()
        .map(|p| import_totals.get(p).copied().unwrap_or(0.0))
        .collect();

    let exp_12m = series::rolling_sum(&exp, 12);
    let imp_12m = series::rolling_sum(&imp, 12);
    let exp_sa = series::seasonally_adjusted_annualized(&exp, seasonal_min_periods);
    let imp_sa = series::seasonally_adjusted_annualized(&imp, seasonal_min_periods);
    let exp_3mma = series::rolling_mean(&exp_sa, 3);
    let imp_3mma = series::rolling_mean(&imp_sa, 3);

    tracing::debug!(periods = periods.len(), "Monthly aggregation built");

    periods
        .into_iter()
        .enumerate()
        .map(|(i, period)| MonthlyTradeRow {
            period,
            monthly: FlowValues::new(exp[i], imp[i]),
            rolling_12m: FlowValues::new(exp_12m[i], imp_12m[i]),
            seasonally_adjusted: FlowValues::new(exp_sa[i], imp_sa[i]),
            three_month_average: FlowValues::new(exp_3mma[i], imp_3mma[i]),
        })
        .collect()
}

/// Latest-period figures for `view`.
pub fn headline(
    rows: &[MonthlyTradeRow],
    view: ViewType,
    gdp_usd_billions: f64,
) -> Result<HeadlineMetrics> {
    let latest = rows.last().ok_or_else(|| TradeError::EmptyAggregationError {
        what: "monthly trade balance".to_string(),
    })?;
    let values = latest.view(view);

    let balance_gdp_percent = if gdp_usd_billions > 0.0 {
        values.balance / 1000.0 / gdp_usd_billions * 100.0
    } else {
        0.0
    };
    let import_coverage = if values.imports > 0.0 {
        values.exports / values.imports
    } else {
        0.0
    };

    Ok(HeadlineMetrics {
        period: latest.period,
        view,
        values,
        balance_gdp_percent,
        import_coverage,
    })
}
