use crate::core::{aggregator, series};
use crate::domain::model::{Direction, Period, TradeDataset, TradeRecord};
use crate::domain::report::{ProductAnalysis, ProductSeriesRow, ProductShare, ProductTable};
use crate::utils::error::{Result, TradeError};
use std::collections::BTreeMap;

pub const OTHERS_CODE: &str = "others";
pub const OTHERS_LABEL: &str = "Others";

/// First period of a trailing window of `months` ending at `latest`.
pub fn window_start(latest: Period, months: u32) -> Period {
    latest.add_months(-(months.max(1) as i64 - 1))
}

/// Product totals over the trailing window, largest first; ties by code.
pub fn product_ranking(records: &[TradeRecord], window_months: u32) -> Vec<ProductShare> {
    let Some(latest) = records.iter().map(|r| r.period).max() else {
        return Vec::new();
    };
    let start = window_start(latest, window_months);
    let totals = aggregator::totals_by_product(records, Some(start));
    let total: f64 = totals.values().sum();
    let labels = product_labels(records);

    let mut ranking: Vec<ProductShare> = totals
        .into_iter()
        .map(|(code, value)| ProductShare {
            product_label: labels.get(&code).cloned().unwrap_or_else(|| code.clone()),
            product_code: code,
            value_usd_millions: value,
            share_percent: share_of(value, total),
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.value_usd_millions
            .total_cmp(&a.value_usd_millions)
            .then_with(|| a.product_code.cmp(&b.product_code))
    });
    ranking
}

/// The `top_n` largest products of the window and an "Others" row with the rest.
pub fn top_products(records: &[TradeRecord], top_n: usize, window_months: u32) -> ProductTable {
    let latest = records.iter().map(|r| r.period).max();
    let mut ranking = product_ranking(records, window_months);
    let distinct_products = ranking.len();
    let total: f64 = ranking.iter().map(|p| p.value_usd_millions).sum();

    let rest = ranking.split_off(top_n.min(ranking.len()));
    let others_value: f64 = rest.iter().map(|p| p.value_usd_millions).sum();

    tracing::debug!(
        distinct_products,
        total_usd_millions = total,
        others_usd_millions = others_value,
        "Product table built"
    );

    ProductTable {
        window_start: latest.map(|p| window_start(p, window_months)),
        window_end: latest,
        total_usd_millions: total,
        distinct_products,
        rows: ranking,
        others: ProductShare {
            product_code: OTHERS_CODE.to_string(),
            product_label: OTHERS_LABEL.to_string(),
            value_usd_millions: others_value,
            share_percent: share_of(others_value, total),
        },
    }
}

/// Monthly series and summary figures for one product in one direction.
pub fn analyze_product(
    dataset: &TradeDataset,
    product_code: &str,
    direction: Direction,
    seasonal_min_periods: usize,
) -> Result<ProductAnalysis> {
    let matching: Vec<&TradeRecord> = dataset
        .records(direction)
        .iter()
        .filter(|r| r.product_code == product_code)
        .collect();
    if matching.is_empty() {
        return Err(TradeError::EmptyAggregationError {
            what: format!("{} of product {}", direction, product_code),
        });
    }
    let product_label = matching[0].product_label().to_string();

    let totals = aggregator::totals_by_period(matching.iter().copied());
    let periods: Vec<Period> = totals.keys().copied().collect();
    let values: Vec<f64> = totals.values().copied().collect();

    let rolling = series::rolling_sum(&values, 12);
    let adjusted = series::seasonally_adjusted_annualized(&values, seasonal_min_periods);
    let averaged = series::rolling_mean(&adjusted, 3);

    let trailing_12m = rolling.last().copied().unwrap_or(0.0);
    let yoy_growth_percent = (rolling.len() > 12).then(|| {
        let base = rolling[rolling.len() - 13];
        if base > 0.0 {
            (trailing_12m / base - 1.0) * 100.0
        } else {
            0.0
        }
    });
    let last_year = &values[values.len().saturating_sub(12)..];
    let average_monthly = last_year.iter().sum::<f64>() / last_year.len() as f64;

    let series_rows = periods
        .into_iter()
        .enumerate()
        .map(|(i, period)| ProductSeriesRow {
            period,
            value: values[i],
            rolling_12m: rolling[i],
            seasonally_adjusted: adjusted[i],
            three_month_average: averaged[i],
        })
        .collect();

    Ok(ProductAnalysis {
        product_code: product_code.to_string(),
        product_label,
        direction,
        series: series_rows,
        trailing_12m_usd_millions: trailing_12m,
        yoy_growth_percent,
        average_monthly_12m_usd_millions: average_monthly,
    })
}

fn product_labels(records: &[TradeRecord]) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    for record in records {
        labels
            .entry(record.product_code.clone())
            .or_insert_with(|| record.product_label().to_string());
    }
    labels
}

fn share_of(value: f64, total: f64) -> f64 {
    if total > 0.0 {
        value / total * 100.0
    } else {
        0.0
    }
}
