//! Fundamental data series and the expected-vs-actual surprise composer.
//!
//! Source records arrive with optional fields; every lookup goes through an
//! explicit `Option` accessor. The composer returns `None` when a required
//! series is absent for an asset (the asset is excluded from that period's
//! ranking) and substitutes zero for any individual term whose inputs are
//! missing or whose denominator is zero. Nothing in this module panics on
//! malformed data.

use chrono::NaiveDate;

use crate::domain::rolling::variance;

/// One reported earnings period: analyst estimate vs. realized EPS.
#[derive(Debug, Clone, PartialEq)]
pub struct EarningsSurprise {
    pub date: NaiveDate,
    pub eps_estimated: Option<f64>,
    pub eps_actual: Option<f64>,
}

/// One analyst-estimate record for a reporting period.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalystEstimate {
    pub date: NaiveDate,
    pub ebitda_estimated: Option<f64>,
    pub ebitda_actual: Option<f64>,
}

/// One discounted-cash-flow model observation.
#[derive(Debug, Clone, PartialEq)]
pub struct DcfValuation {
    pub date: NaiveDate,
    pub model_price: Option<f64>,
}

/// Record `offset` periods back from the latest (0 = latest).
fn nth_back<T>(series: &[T], offset: usize) -> Option<&T> {
    let n = series.len();
    if offset >= n {
        return None;
    }
    Some(&series[n - 1 - offset])
}

/// `estimate / actual - 1`, or 0.0 when either side is missing or the
/// actual is zero.
fn surprise_ratio(estimate: Option<f64>, actual: Option<f64>) -> f64 {
    match (estimate, actual) {
        (Some(e), Some(a)) if a != 0.0 => e / a - 1.0,
        _ => 0.0,
    }
}

/// `1 / var`, or 0.0 when the variance is zero or undefined.
fn inverse_variance(values: &[f64]) -> f64 {
    match variance(values) {
        Some(v) if v != 0.0 => 1.0 / v,
        _ => 0.0,
    }
}

/// Expected-side and trailing-side surprise scores for one asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurpriseScore {
    pub expected: f64,
    pub trailing: f64,
    pub combined: f64,
}

/// Weighted expected-vs-actual composer.
#[derive(Debug, Clone)]
pub struct SurpriseScorer {
    pub w_eps_ratio: f64,
    pub w_variance: f64,
    pub w_ebitda_ratio: f64,
    pub w_expected: f64,
    pub w_trailing: f64,
    pub eps_history: usize,
}

impl Default for SurpriseScorer {
    fn default() -> Self {
        SurpriseScorer {
            w_eps_ratio: 0.5,
            w_variance: 0.3,
            w_ebitda_ratio: 0.2,
            w_expected: 0.4,
            w_trailing: 0.6,
            eps_history: 13,
        }
    }
}

impl SurpriseScorer {
    /// Score one asset from its earnings and estimate series. `None` when
    /// either series is empty; individual missing fields degrade to zero
    /// terms.
    pub fn score(
        &self,
        earnings: &[EarningsSurprise],
        estimates: &[AnalystEstimate],
    ) -> Option<SurpriseScore> {
        if earnings.is_empty() || estimates.is_empty() {
            return None;
        }

        let latest = nth_back(earnings, 0)?;
        let b1 = surprise_ratio(latest.eps_estimated, latest.eps_actual);
        let a1 = match (latest.eps_actual, nth_back(earnings, 1).and_then(|r| r.eps_estimated)) {
            (Some(actual), Some(prev_est)) => actual - prev_est,
            _ => 0.0,
        };

        let eps_series: Vec<f64> = earnings
            .iter()
            .rev()
            .take(self.eps_history)
            .filter_map(|r| r.eps_actual)
            .collect();
        let b2 = inverse_variance(&eps_series);
        let a2 = if eps_series.len() > 2 {
            inverse_variance(&eps_series[1..])
        } else {
            b2
        };

        let latest_est = nth_back(estimates, 0)?;
        let b3 = surprise_ratio(latest_est.ebitda_estimated, latest_est.ebitda_actual);
        let a3 = match (
            latest_est.ebitda_actual,
            nth_back(estimates, 1).and_then(|r| r.ebitda_estimated),
        ) {
            (Some(actual), Some(prev_est)) => actual - prev_est,
            _ => 0.0,
        };

        let expected = self.w_eps_ratio * b1 + self.w_variance * b2 + self.w_ebitda_ratio * b3;
        let trailing = self.w_eps_ratio * a1 + self.w_variance * a2 + self.w_ebitda_ratio * a3;
        let combined = self.w_expected * expected + self.w_trailing * trailing;

        Some(SurpriseScore {
            expected,
            trailing,
            combined,
        })
    }
}

/// Valuation drift of a DCF model price against the first price seen for
/// the asset.
///
/// With `num = model/base - 1` and `delta = model - base`: a negative delta
/// deflates the drift by `delta * atr` (skipped when that denominator is
/// zero); a non-negative delta returns `num` directly. Falls back to the
/// current price when the model series is empty, and to 0.0 when the base
/// price is zero.
pub fn valuation_drift(
    dcf: &[DcfValuation],
    base_price: f64,
    current_price: f64,
    atr: f64,
) -> f64 {
    let model = nth_back(dcf, 0)
        .and_then(|r| r.model_price)
        .unwrap_or(current_price);

    if base_price == 0.0 {
        return 0.0;
    }
    let num = model / base_price - 1.0;
    let delta = model - base_price;

    if delta < 0.0 {
        let denom = delta * atr;
        if denom != 0.0 { num / denom } else { num }
    } else {
        num
    }
}
