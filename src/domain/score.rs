//! Composite trend score: rating-conditioned lookup tables, horizon
//! weights, momentum penalty, and trailing smoothing.
//!
//! Component scores live on a 0..5 scale; the weighted sum is scaled by 25
//! and a blended momentum term (scaled by 100) is subtracted, so the
//! nominal full-scale of the raw score is roughly -100..125 before
//! smoothing. The smoothed score divided by 100, clipped to [0, 1], is the
//! allocation fraction.

use crate::domain::features::{
    DirectionCategory, StrengthCategory, TrendRating, direction_category, realized_vol_score,
    strength_category, trend_rating,
};
use crate::domain::rolling::{mean, pct_change, rolling_mean};

/// Rating → score.
pub fn rating_score(rating: TrendRating) -> f64 {
    match rating {
        TrendRating::Buy => 5.0,
        TrendRating::Hold => 2.0,
        TrendRating::Sell => 0.0,
    }
}

/// Direction → score, conditioned on the rating. The same direction reads
/// differently under opposite ratings: `Strongest` scores 5 under `Buy` but
/// 0 under `Sell`.
pub fn direction_score(rating: TrendRating, direction: DirectionCategory) -> f64 {
    match rating {
        TrendRating::Buy => match direction {
            DirectionCategory::Strongest => 5.0,
            DirectionCategory::Strengthening => 4.0,
            DirectionCategory::Average => 2.0,
            DirectionCategory::Weakening => 1.0,
            DirectionCategory::Weakest => 0.0,
        },
        TrendRating::Hold => match direction {
            DirectionCategory::Strongest => 3.0,
            DirectionCategory::Strengthening => 2.0,
            DirectionCategory::Average => 2.0,
            DirectionCategory::Weakening => 1.0,
            DirectionCategory::Weakest => 0.0,
        },
        TrendRating::Sell => match direction {
            DirectionCategory::Strongest => 0.0,
            DirectionCategory::Strengthening => 0.0,
            DirectionCategory::Average => 0.0,
            DirectionCategory::Weakening => 1.0,
            DirectionCategory::Weakest => 2.0,
        },
    }
}

/// Strength → score, conditioned on the rating.
pub fn strength_score(rating: TrendRating, strength: StrengthCategory) -> f64 {
    match rating {
        TrendRating::Buy | TrendRating::Hold => match strength {
            StrengthCategory::Maximum => 5.0,
            StrengthCategory::Strong => 4.0,
            StrengthCategory::Average => 2.0,
            StrengthCategory::Soft => 1.0,
            StrengthCategory::Weak => 0.0,
        },
        TrendRating::Sell => match strength {
            StrengthCategory::Maximum => 0.0,
            StrengthCategory::Strong => 0.0,
            StrengthCategory::Average => 1.0,
            StrengthCategory::Soft => 1.0,
            StrengthCategory::Weak => 2.0,
        },
    }
}

/// Per-component weights of the composite score. The reference constants
/// sum to 0.92; variants tune these without touching the mechanism.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeWeights {
    pub ma_20: f64,
    pub dir_20: f64,
    pub str_20: f64,
    pub vol: f64,
    pub ma_50: f64,
    pub dir_50: f64,
    pub str_50: f64,
    pub ma_150: f64,
    pub dir_150: f64,
    pub str_150: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        CompositeWeights {
            ma_20: 0.12,
            dir_20: 0.12,
            str_20: 0.08,
            vol: 0.10,
            ma_50: 0.12,
            dir_50: 0.12,
            str_50: 0.08,
            ma_150: 0.08,
            dir_150: 0.05,
            str_150: 0.05,
        }
    }
}

const HORIZONS: [usize; 3] = [20, 50, 150];
const MOMENTUM_WINDOWS: [usize; 4] = [5, 10, 20, 50];

/// Rolling buffer of raw composite scores, persisted across invocations to
/// smooth the output. Constructible empty for a fresh strategy instance.
#[derive(Debug, Clone, Default)]
pub struct ScoreState {
    raw: Vec<f64>,
}

impl ScoreState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    fn push(&mut self, value: f64, window: usize) {
        self.raw.push(value);
        if self.raw.len() > window {
            self.raw.remove(0);
        }
    }

    fn smoothed(&self) -> f64 {
        mean(&self.raw).unwrap_or(0.0)
    }
}

/// Composite scorer over the 20/50/150-bar horizons.
#[derive(Debug, Clone)]
pub struct CompositeScorer {
    pub weights: CompositeWeights,
    pub vol_window: usize,
    pub vol_lookback: usize,
    pub smoothing_window: usize,
}

impl Default for CompositeScorer {
    fn default() -> Self {
        CompositeScorer {
            weights: CompositeWeights::default(),
            vol_window: 21,
            vol_lookback: 126,
            smoothing_window: 10,
        }
    }
}

impl CompositeScorer {
    /// Raw composite score for the current bar, before smoothing.
    pub fn raw_score(&self, closes: &[f64]) -> f64 {
        let w = &self.weights;
        let mut weighted = 0.0;

        for &horizon in &HORIZONS {
            let ma = rolling_mean(closes, horizon);
            let rating = trend_rating(&ma);
            let direction = direction_category(&ma, horizon);
            let strength = strength_category(closes, horizon);

            let (wm, wd, ws) = match horizon {
                20 => (w.ma_20, w.dir_20, w.str_20),
                50 => (w.ma_50, w.dir_50, w.str_50),
                _ => (w.ma_150, w.dir_150, w.str_150),
            };
            weighted += wm * rating_score(rating);
            weighted += wd * direction_score(rating, direction);
            weighted += ws * strength_score(rating, strength);
        }

        weighted += w.vol * realized_vol_score(closes, self.vol_window, self.vol_lookback);

        let momentum = MOMENTUM_WINDOWS
            .iter()
            .map(|&n| pct_change(closes, n).unwrap_or(0.0))
            .sum::<f64>()
            / MOMENTUM_WINDOWS.len() as f64;

        weighted * 25.0 - momentum * 100.0
    }

    /// Score the current bar, fold it into the rolling buffer, and return
    /// the smoothed value.
    pub fn update(&self, state: &mut ScoreState, closes: &[f64]) -> f64 {
        let raw = self.raw_score(closes);
        state.push(raw, self.smoothing_window);
        state.smoothed()
    }
}

/// Map a smoothed score to an allocation fraction: `clamp(score/100, 0, 1)`.
pub fn score_to_fraction(score: f64) -> f64 {
    (score / 100.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rating_scores() {
        assert_relative_eq!(rating_score(TrendRating::Buy), 5.0);
        assert_relative_eq!(rating_score(TrendRating::Hold), 2.0);
        assert_relative_eq!(rating_score(TrendRating::Sell), 0.0);
    }

    #[test]
    fn direction_score_flips_with_rating() {
        assert_relative_eq!(
            direction_score(TrendRating::Buy, DirectionCategory::Strongest),
            5.0
        );
        assert_relative_eq!(
            direction_score(TrendRating::Sell, DirectionCategory::Strongest),
            0.0
        );
        assert_relative_eq!(
            direction_score(TrendRating::Sell, DirectionCategory::Weakest),
            2.0
        );
        assert_relative_eq!(
            direction_score(TrendRating::Hold, DirectionCategory::Strongest),
            3.0
        );
    }

    #[test]
    fn strength_score_flips_with_rating() {
        assert_relative_eq!(
            strength_score(TrendRating::Buy, StrengthCategory::Maximum),
            5.0
        );
        assert_relative_eq!(
            strength_score(TrendRating::Sell, StrengthCategory::Maximum),
            0.0
        );
        assert_relative_eq!(
            strength_score(TrendRating::Sell, StrengthCategory::Weak),
            2.0
        );
    }

    #[test]
    fn raw_score_neutral_on_short_history() {
        // Every feature degrades to its neutral category: ratings Hold (2),
        // directions Average (2), strengths Average (2), volatility 0,
        // momentum 0 → weighted 1.64 → raw 41.0
        let scorer = CompositeScorer::default();
        assert_relative_eq!(scorer.raw_score(&[100.0; 5]), 41.0);
    }

    #[test]
    fn raw_score_is_deterministic() {
        let closes: Vec<f64> = (0..300).map(|i| 100.0 + (i as f64 * 0.3).sin()).collect();
        let scorer = CompositeScorer::default();
        assert_relative_eq!(scorer.raw_score(&closes), scorer.raw_score(&closes));
    }

    #[test]
    fn update_smooths_over_window() {
        let scorer = CompositeScorer {
            smoothing_window: 3,
            ..Default::default()
        };
        let mut state = ScoreState::new();
        let closes = [100.0; 5];

        let first = scorer.update(&mut state, &closes);
        assert_relative_eq!(first, 41.0);
        scorer.update(&mut state, &closes);
        scorer.update(&mut state, &closes);
        scorer.update(&mut state, &closes);
        assert_eq!(state.len(), 3);
    }

    #[test]
    fn state_starts_empty() {
        let state = ScoreState::new();
        assert!(state.is_empty());
        assert_relative_eq!(state.smoothed(), 0.0);
    }

    #[test]
    fn fraction_clips_to_unit_interval() {
        assert_relative_eq!(score_to_fraction(150.0), 1.0);
        assert_relative_eq!(score_to_fraction(-20.0), 0.0);
        assert_relative_eq!(score_to_fraction(41.0), 0.41);
    }
}
