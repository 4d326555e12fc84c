//! Rolling-window statistics over price and score series.
//!
//! All functions are pure and aligned to their input: output index `i`
//! corresponds to input index `i`, with `None` during warmup. Series are
//! oldest-first throughout.

use crate::domain::bar::Bar;

/// Simple moving average over `period` observations.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for i in 0..values.len() {
        sum += values[i];
        if i >= period {
            sum -= values[i - period];
        }
        if i + 1 >= period {
            out.push(Some(sum / period as f64));
        } else {
            out.push(None);
        }
    }
    out
}

/// Population standard deviation over `period` observations.
pub fn rolling_std(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if i + 1 < period {
            out.push(None);
            continue;
        }
        let window = &values[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window
            .iter()
            .map(|v| {
                let d = v - mean;
                d * d
            })
            .sum::<f64>()
            / period as f64;
        out.push(Some(variance.sqrt()));
    }
    out
}

/// Exponential moving average, k = 2/(n+1), seeded with the first SMA.
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    let mut prev = 0.0;
    for (i, &v) in values.iter().enumerate() {
        if i + 1 < period {
            sum += v;
            out.push(None);
        } else if i + 1 == period {
            sum += v;
            prev = sum / period as f64;
            out.push(Some(prev));
        } else {
            prev = v * k + prev * (1.0 - k);
            out.push(Some(prev));
        }
    }
    out
}

/// Exponentially weighted mean with the given span, seeded with the first
/// value. No warmup: defined from the first observation, as pandas-style
/// `ewm(span)` smoothing behaves on score series.
pub fn ewm_span(values: &[f64], span: usize) -> Vec<f64> {
    if values.is_empty() || span == 0 {
        return Vec::new();
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev = values[0];
    out.push(prev);
    for &v in &values[1..] {
        prev = v * alpha + prev * (1.0 - alpha);
        out.push(prev);
    }
    out
}

/// Wilder-smoothed average true range.
///
/// Seed is the mean of the first `period` true ranges; afterwards
/// `ATR[i] = (ATR[i-1]*(n-1) + TR[i]) / n`.
pub fn atr(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    if period == 0 || bars.len() < period {
        return vec![None; bars.len()];
    }
    let tr: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect();

    let mut out = Vec::with_capacity(bars.len());
    let mut prev = 0.0;
    for i in 0..bars.len() {
        if i + 1 < period {
            out.push(None);
        } else if i + 1 == period {
            prev = tr[..=i].iter().sum::<f64>() / period as f64;
            out.push(Some(prev));
        } else {
            prev = (prev * (period - 1) as f64 + tr[i]) / period as f64;
            out.push(Some(prev));
        }
    }
    out
}

/// First difference of an optional series; defined where both operands are.
pub fn diff(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if i == 0 {
            out.push(None);
        } else {
            out.push(match (values[i], values[i - 1]) {
                (Some(a), Some(b)) => Some(a - b),
                _ => None,
            });
        }
    }
    out
}

/// Percentage change of the last value over `period` observations:
/// `last / values[n-1-period] - 1`. `None` when the history is too short or
/// the base is zero.
pub fn pct_change(values: &[f64], period: usize) -> Option<f64> {
    let n = values.len();
    if period == 0 || n <= period {
        return None;
    }
    let base = values[n - 1 - period];
    if base == 0.0 {
        return None;
    }
    Some(values[n - 1] / base - 1.0)
}

/// Linearly interpolated quantile, `q` in [0, 1].
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance; `None` for fewer than two observations.
pub fn variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    Some(
        values
            .iter()
            .map(|v| {
                let d = v - m;
                d * d
            })
            .sum::<f64>()
            / values.len() as f64,
    )
}
