//! Window and seasonal-adjustment helpers over monthly value slices.
//!
//! Windows count rows, not calendar months: a gap in the input shortens
//! nothing and shifts nothing.

/// Months per seasonal cycle.
pub const SEASON_LENGTH: usize = 12;

/// Trailing sum over up to `window` rows (at least one).
pub fn rolling_sum(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(values.len());
    let mut acc = 0.0;
    for (i, value) in values.iter().enumerate() {
        acc += value;
        if i >= window {
            acc -= values[i - window];
        }
        out.push(acc);
    }
    out
}

/// Trailing mean over up to `window` rows (at least one).
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    rolling_sum(values, window)
        .into_iter()
        .enumerate()
        .map(|(i, sum)| sum / (i + 1).min(window) as f64)
        .collect()
}

/// Annualized seasonally adjusted values.
///
/// With at least `min_periods` rows the series is decomposed additively with
/// a 12-month cycle and the seasonal component removed before annualizing
/// (x12). Shorter series are only annualized.
pub fn seasonally_adjusted_annualized(values: &[f64], min_periods: usize) -> Vec<f64> {
    let min_periods = min_periods.max(2 * SEASON_LENGTH);
    if values.len() < min_periods {
        tracing::debug!(
            rows = values.len(),
            min_periods,
            "Too few periods for seasonal adjustment, annualizing only"
        );
        return values.iter().map(|v| v * SEASON_LENGTH as f64).collect();
    }

    let seasonal = seasonal_component(values, SEASON_LENGTH);
    values
        .iter()
        .zip(seasonal)
        .map(|(value, season)| (value - season) * SEASON_LENGTH as f64)
        .collect()
}

/// Seasonal component of a classical additive decomposition.
///
/// Trend: centered moving average (2x`period` for even periods), its missing
/// ends filled by least-squares lines through the `period - 1` nearest trend
/// points. Seasonal: per-position mean of the detrended values, re-centered
/// to sum to zero over one cycle.
pub fn seasonal_component(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    if period < 2 || n < 2 * period {
        return vec![0.0; n];
    }

    let mut trend = centered_moving_average(values, period);
    extrapolate_trend(&mut trend, period - 1);

    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (i, (value, trend_value)) in values.iter().zip(&trend).enumerate() {
        if let Some(t) = trend_value {
            sums[i % period] += value - t;
            counts[i % period] += 1;
        }
    }

    let mut averages: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(sum, count)| if *count > 0 { sum / *count as f64 } else { 0.0 })
        .collect();
    let mean = averages.iter().sum::<f64>() / period as f64;
    for average in &mut averages {
        *average -= mean;
    }

    (0..n).map(|i| averages[i % period]).collect()
}

fn centered_moving_average(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let weights: Vec<f64> = if period % 2 == 0 {
        let mut w = vec![1.0 / period as f64; period + 1];
        w[0] = 0.5 / period as f64;
        w[period] = 0.5 / period as f64;
        w
    } else {
        vec![1.0 / period as f64; period]
    };
    let half = weights.len() / 2;

    (0..values.len())
        .map(|i| {
            if i < half || i + half >= values.len() {
                return None;
            }
            let start = i - half;
            Some(
                weights
                    .iter()
                    .enumerate()
                    .map(|(k, w)| w * values[start + k])
                    .sum(),
            )
        })
        .collect()
}

fn extrapolate_trend(trend: &mut [Option<f64>], npoints: usize) {
    let Some(front) = trend.iter().position(Option::is_some) else {
        return;
    };
    let Some(back) = trend.iter().rposition(Option::is_some) else {
        return;
    };

    let front_last = (front + npoints).min(back);
    let back_first = back.saturating_sub(npoints).max(front);

    let (slope, intercept) = fit_line(trend, front, front_last);
    for (i, slot) in trend.iter_mut().enumerate().take(front) {
        *slot = Some(slope * i as f64 + intercept);
    }

    let (slope, intercept) = fit_line(trend, back_first, back);
    for (i, slot) in trend.iter_mut().enumerate().skip(back + 1) {
        *slot = Some(slope * i as f64 + intercept);
    }
}

/// Least-squares line through `trend[start..end]`, x being the index.
fn fit_line(trend: &[Option<f64>], start: usize, end: usize) -> (f64, f64) {
    let points: Vec<(f64, f64)> = (start..end)
        .filter_map(|i| trend[i].map(|y| (i as f64, y)))
        .collect();
    if points.is_empty() {
        return (0.0, 0.0);
    }

    let count = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / count;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / count;
    let sxx: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    let sxy: f64 = points
        .iter()
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();

    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    (slope, mean_y - slope * mean_x)
}
