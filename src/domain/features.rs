//! Per-asset feature extraction from a price window.
//!
//! Every extractor is a total function of its window: short or degenerate
//! history maps to the neutral category (`Hold`, `Average`) or 0.0, never an
//! error. The consuming score composer has no error channel.

use crate::domain::rolling::{diff, mean, quantile, rolling_std};

/// Buy/Hold/Sell rating from the slope and curvature of a smoothed series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendRating {
    Buy,
    Hold,
    Sell,
}

/// Trend direction classified against dynamic slope percentiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionCategory {
    Strongest,
    Strengthening,
    Average,
    Weakening,
    Weakest,
}

/// Price strength bucketed from percentage change over a fixed look-back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrengthCategory {
    Weak,
    Soft,
    Average,
    Strong,
    Maximum,
}

const MIN_RATING_POINTS: usize = 10;
const SLOPE_BUY: f64 = 0.1;
const ACCEL_BUY: f64 = 0.05;
const SLOPE_SELL: f64 = -0.1;
const ACCEL_SELL: f64 = -0.05;
const RECENT_ACCEL_SELL: f64 = -0.02;

const SLOPE_WINDOW: usize = 512;
const STRONG_PERCENTILE: f64 = 0.65;
const WEAK_PERCENTILE: f64 = 0.35;
const ACCEL_CUT: f64 = 0.05;

fn valid_count(series: &[Option<f64>]) -> usize {
    series.iter().filter(|v| v.is_some()).count()
}

fn last_defined(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}

/// Mean of the defined values among the last `n` entries.
fn recent_mean(series: &[Option<f64>], n: usize) -> Option<f64> {
    let start = series.len().saturating_sub(n);
    let tail: Vec<f64> = series[start..].iter().filter_map(|v| *v).collect();
    mean(&tail)
}

/// Buy/Sell/Hold rating from the first and second differences of a smoothed
/// series. Fewer than 10 defined points, or an undefined current slope or
/// acceleration, rates `Hold`.
pub fn trend_rating(smoothed: &[Option<f64>]) -> TrendRating {
    if valid_count(smoothed) < MIN_RATING_POINTS {
        return TrendRating::Hold;
    }

    let slope = diff(smoothed);
    let accel = diff(&slope);

    let (Some(s), Some(a)) = (last_defined(&slope), last_defined(&accel)) else {
        return TrendRating::Hold;
    };
    let Some(recent_a) = recent_mean(&accel, 3) else {
        return TrendRating::Hold;
    };

    if s > SLOPE_BUY && a > ACCEL_BUY && recent_a > 0.0 {
        TrendRating::Buy
    } else if s < SLOPE_SELL || (a < ACCEL_SELL && recent_a < RECENT_ACCEL_SELL) {
        TrendRating::Sell
    } else {
        TrendRating::Hold
    }
}

/// Direction category with dynamic thresholds: the strong/weak slope
/// cut-points are the 65th/35th percentile of the trailing 512 slope
/// observations. Short history or undefined values classify `Average`.
pub fn direction_category(smoothed: &[Option<f64>], horizon: usize) -> DirectionCategory {
    if valid_count(smoothed) < horizon {
        return DirectionCategory::Average;
    }

    let slope = diff(smoothed);
    let accel = diff(&slope);

    let (Some(s), Some(a)) = (last_defined(&slope), last_defined(&accel)) else {
        return DirectionCategory::Average;
    };

    let slopes: Vec<f64> = slope.iter().filter_map(|v| *v).collect();
    let window_start = slopes.len().saturating_sub(SLOPE_WINDOW);
    let window = &slopes[window_start..];
    let (Some(strong), Some(weak)) = (
        quantile(window, STRONG_PERCENTILE),
        quantile(window, WEAK_PERCENTILE),
    ) else {
        return DirectionCategory::Average;
    };

    if s > strong {
        DirectionCategory::Strongest
    } else if s < weak && a < -ACCEL_CUT {
        DirectionCategory::Weakest
    } else if s < weak && a > ACCEL_CUT {
        DirectionCategory::Strengthening
    } else if s > strong && a < -ACCEL_CUT {
        DirectionCategory::Weakening
    } else {
        DirectionCategory::Average
    }
}

/// Threshold quadruple [t0, t1, t2, t3] for a strength look-back.
fn strength_thresholds(horizon: usize) -> [f64; 4] {
    match horizon {
        20 => [-0.02, 0.03, 0.05, 0.08],
        50 => [-0.05, 0.04, 0.08, 0.12],
        _ => [-0.05, 0.05, 0.10, 0.15],
    }
}

/// Strength bucket from percentage change over `horizon` bars, against
/// look-back-specific thresholds. Insufficient history is `Average`.
pub fn strength_category(closes: &[f64], horizon: usize) -> StrengthCategory {
    if closes.len() < horizon + 1 {
        return StrengthCategory::Average;
    }
    let base = closes[closes.len() - 1 - horizon];
    if base == 0.0 {
        return StrengthCategory::Average;
    }
    let pct = closes[closes.len() - 1] / base - 1.0;
    let [t0, t1, t2, t3] = strength_thresholds(horizon);

    if pct > t1 && pct <= t2 {
        StrengthCategory::Average
    } else if pct <= t0 {
        StrengthCategory::Weak
    } else if pct <= t1 {
        StrengthCategory::Soft
    } else if pct <= t3 {
        StrengthCategory::Strong
    } else {
        StrengthCategory::Maximum
    }
}

const TRADING_DAYS: f64 = 252.0;
const MIN_VOL_DIST: usize = 20;

/// Inverse realized-volatility score.
///
/// Annualized rolling volatility of daily returns, ranked against the decile
/// cut-points of the trailing `lookback` observations (latest excluded).
/// Rank 0 (lowest volatility) maps to +10, rank 9 to -10. Returns 0.0 when
/// fewer than `lookback` volatility observations exist or the trailing
/// distribution holds fewer than 20.
pub fn realized_vol_score(closes: &[f64], window: usize, lookback: usize) -> f64 {
    if closes.len() < 2 {
        return 0.0;
    }
    let returns: Vec<f64> = closes
        .windows(2)
        .map(|w| if w[0] == 0.0 { 0.0 } else { w[1] / w[0] - 1.0 })
        .collect();

    let vols: Vec<f64> = rolling_std(&returns, window)
        .into_iter()
        .flatten()
        .map(|v| v * TRADING_DAYS.sqrt())
        .collect();

    if vols.len() < lookback {
        return 0.0;
    }

    let latest = vols[vols.len() - 1];
    let dist_start = vols.len().saturating_sub(lookback + 1);
    let dist = &vols[dist_start..vols.len() - 1];
    if dist.len() < MIN_VOL_DIST {
        return 0.0;
    }

    let mut rank = 0;
    for i in 1..=9 {
        if let Some(cut) = quantile(dist, i as f64 / 10.0) {
            if latest > cut {
                rank += 1;
            }
        }
    }
    10.0 - rank as f64 * (20.0 / 9.0)
}
