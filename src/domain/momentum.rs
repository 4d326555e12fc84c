//! Blended True Strength Index scoring and the Keltner-style envelope
//! applied to the score series itself.
//!
//! The TSI is a double-smoothed momentum oscillator on price differences.
//! Two parameterizations are blended into one raw score per asset; the
//! score history is process state, smoothed and banded to drive a stepped
//! exposure ladder.

use crate::domain::rolling::{ewm_span, mean, quantile, rolling_std};

/// Latest True Strength Index value: double-EMA of price differences over
/// double-EMA of their absolute values. `None` until two closes exist; 0.0
/// when the denominator is zero (a flat series).
pub fn tsi(closes: &[f64], short: usize, long: usize) -> Option<f64> {
    if closes.len() < 2 || short == 0 || long == 0 {
        return None;
    }
    let diffs: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let abs_diffs: Vec<f64> = diffs.iter().map(|d| d.abs()).collect();

    let num = ewm_span(&ewm_span(&diffs, short), long);
    let den = ewm_span(&ewm_span(&abs_diffs, short), long);

    let n = *num.last()?;
    let d = *den.last()?;
    if d == 0.0 { Some(0.0) } else { Some(n / d) }
}

/// Parameters of the blended momentum score and its envelope.
#[derive(Debug, Clone)]
pub struct MomentumConfig {
    pub short_fast: usize,
    pub short_slow: usize,
    pub long_fast: usize,
    pub long_slow: usize,
    pub short_weight: f64,
    pub smoothing_window: usize,
    pub roc_span: usize,
    pub band_window: usize,
    pub band_mult: f64,
    pub support_quantile: f64,
    pub support_min_obs: usize,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        MomentumConfig {
            short_fast: 10,
            short_slow: 20,
            long_fast: 40,
            long_slow: 80,
            short_weight: 0.75,
            smoothing_window: 5,
            roc_span: 5,
            band_window: 31,
            band_mult: 4.0,
            support_quantile: 0.20,
            support_min_obs: 100,
        }
    }
}

impl MomentumConfig {
    /// Blended raw score: short-horizon TSI weighted against long-horizon.
    pub fn blended_score(&self, closes: &[f64]) -> Option<f64> {
        let short = tsi(closes, self.short_fast, self.short_slow)?;
        let long = tsi(closes, self.long_fast, self.long_slow)?;
        Some(self.short_weight * short + (1.0 - self.short_weight) * long)
    }
}

/// Per-asset raw score history, persisted across invocations.
#[derive(Debug, Clone, Default)]
pub struct ScoreHistory {
    values: Vec<f64>,
}

impl ScoreHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Trailing mean over the smoothing window; `None` until it fills.
    pub fn smoothed(&self, window: usize) -> Option<f64> {
        if self.values.len() < window || window == 0 {
            return None;
        }
        mean(&self.values[self.values.len() - window..])
    }

    /// Difference over `span` observations; `None` until enough history.
    pub fn rate_of_change(&self, span: usize) -> Option<f64> {
        let n = self.values.len();
        if span == 0 || n <= span {
            return None;
        }
        Some(self.values[n - 1] - self.values[n - 1 - span])
    }

    /// Rolling mean ± mult × rolling stdev over the band window, evaluated
    /// at the latest observation.
    pub fn band(&self, window: usize, mult: f64) -> Option<ScoreBand> {
        if self.values.len() < window {
            return None;
        }
        let tail = &self.values[self.values.len() - window..];
        let midline = mean(tail)?;
        let std = rolling_std(tail, window).last().copied().flatten()?;
        Some(ScoreBand {
            midline,
            lower: midline - mult * std,
        })
    }

    /// Lower-quantile support level of the full score history; defined only
    /// once `min_obs` observations exist.
    pub fn support(&self, q: f64, min_obs: usize) -> Option<f64> {
        if self.values.len() < min_obs {
            return None;
        }
        quantile(&self.values, q)
    }
}

/// Envelope evaluated on a score series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBand {
    pub midline: f64,
    pub lower: f64,
}

/// Stepped exposure for a score against its envelope: full above the
/// midline, half above the lower band, quarter above the support level,
/// flat otherwise.
pub fn exposure_ladder(score: f64, band: ScoreBand, support: Option<f64>) -> f64 {
    if score > band.midline {
        1.0
    } else if score > band.lower {
        0.5
    } else if support.is_some_and(|s| score > s) {
        0.25
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn tsi_needs_two_closes() {
        assert_eq!(tsi(&[100.0], 10, 20), None);
    }

    #[test]
    fn tsi_flat_series_is_zero() {
        let closes = vec![100.0; 50];
        assert_relative_eq!(tsi(&closes, 10, 20).unwrap(), 0.0);
    }

    #[test]
    fn tsi_monotonic_rise_is_one() {
        // every diff positive and equal → num == den
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        assert_relative_eq!(tsi(&closes, 10, 20).unwrap(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn tsi_monotonic_fall_is_minus_one() {
        let closes: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
        assert_relative_eq!(tsi(&closes, 10, 20).unwrap(), -1.0, epsilon = 1e-9);
    }

    #[test]
    fn tsi_bounded() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0)
            .collect();
        let v = tsi(&closes, 10, 20).unwrap();
        assert!((-1.0..=1.0).contains(&v));
    }

    #[test]
    fn blended_score_weights_horizons() {
        let closes: Vec<f64> = (0..120).map(|i| 100.0 + i as f64).collect();
        let cfg = MomentumConfig::default();
        // both horizons saturate at 1.0 on a monotonic rise
        assert_relative_eq!(cfg.blended_score(&closes).unwrap(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn smoothed_requires_full_window() {
        let mut hist = ScoreHistory::new();
        for i in 0..4 {
            hist.push(i as f64);
        }
        assert_eq!(hist.smoothed(5), None);
        hist.push(4.0);
        assert_relative_eq!(hist.smoothed(5).unwrap(), 2.0);
    }

    #[test]
    fn rate_of_change_spans_observations() {
        let mut hist = ScoreHistory::new();
        for v in [1.0, 2.0, 4.0, 7.0, 11.0, 16.0] {
            hist.push(v);
        }
        assert_relative_eq!(hist.rate_of_change(5).unwrap(), 15.0);
        assert_eq!(hist.rate_of_change(6), None);
    }

    #[test]
    fn band_on_constant_history_collapses() {
        let mut hist = ScoreHistory::new();
        for _ in 0..31 {
            hist.push(0.5);
        }
        let band = hist.band(31, 4.0).unwrap();
        assert_relative_eq!(band.midline, 0.5);
        assert_relative_eq!(band.lower, 0.5);
    }

    #[test]
    fn band_missing_until_window_fills() {
        let mut hist = ScoreHistory::new();
        for _ in 0..30 {
            hist.push(0.5);
        }
        assert!(hist.band(31, 4.0).is_none());
    }

    #[test]
    fn support_needs_minimum_observations() {
        let mut hist = ScoreHistory::new();
        for i in 0..99 {
            hist.push(i as f64);
        }
        assert_eq!(hist.support(0.2, 100), None);
        hist.push(99.0);
        // 20th percentile of 0..=99 → 19.8
        assert_relative_eq!(hist.support(0.2, 100).unwrap(), 19.8);
    }

    #[test]
    fn exposure_ladder_steps() {
        let band = ScoreBand {
            midline: 0.6,
            lower: 0.2,
        };
        assert_relative_eq!(exposure_ladder(0.7, band, Some(0.0)), 1.0);
        assert_relative_eq!(exposure_ladder(0.4, band, Some(0.0)), 0.5);
        assert_relative_eq!(exposure_ladder(0.1, band, Some(0.0)), 0.25);
        assert_relative_eq!(exposure_ladder(-0.1, band, Some(0.0)), 0.0);
        assert_relative_eq!(exposure_ladder(0.1, band, None), 0.0);
    }
}
