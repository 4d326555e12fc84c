//! Cross-asset ranking, liquidity pre-filtering, and streak-based
//! eligibility gating.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::bar::Bar;
use crate::domain::rolling::quantile;

/// Trailing dollar-volume liquidity filter. Assets failing it are excluded
/// from scoring and ranking entirely and acquire no streak credit.
#[derive(Debug, Clone)]
pub struct LiquidityFilter {
    pub lookback: usize,
    pub min_bars: usize,
    pub min_dollar_volume: f64,
}

impl Default for LiquidityFilter {
    fn default() -> Self {
        LiquidityFilter {
            lookback: 20,
            min_bars: 5,
            min_dollar_volume: 10_000_000.0,
        }
    }
}

impl LiquidityFilter {
    /// Mean volume over the lookback times the last close, against the
    /// floor. Requires at least `min_bars` trailing bars.
    pub fn is_liquid(&self, bars: &[Bar]) -> bool {
        if bars.is_empty() {
            return false;
        }
        let start = bars.len().saturating_sub(self.lookback);
        let recent = &bars[start..];
        if recent.len() < self.min_bars {
            return false;
        }
        let avg_volume =
            recent.iter().map(|b| b.volume as f64).sum::<f64>() / recent.len() as f64;
        let last_close = recent[recent.len() - 1].close;
        avg_volume * last_close >= self.min_dollar_volume
    }
}

/// Per-asset counters of consecutive qualifying periods. Reset to zero the
/// moment an asset fails to qualify; never negative. Assets not observed in
/// a period keep their counter untouched.
#[derive(Debug, Clone, Default)]
pub struct StreakState {
    counts: HashMap<String, u32>,
}

impl StreakState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> u32 {
        self.counts.get(symbol).copied().unwrap_or(0)
    }

    /// Record one period's outcome for a symbol and return the new count.
    pub fn observe(&mut self, symbol: &str, qualified: bool) -> u32 {
        let count = if qualified { self.get(symbol) + 1 } else { 0 };
        self.counts.insert(symbol.to_string(), count);
        count
    }

    /// Symbols whose streak has reached the floor.
    pub fn eligible(&self, floor: u32) -> Vec<String> {
        let mut symbols: Vec<String> = self
            .counts
            .iter()
            .filter(|&(_, &count)| count >= floor)
            .map(|(symbol, _)| symbol.clone())
            .collect();
        symbols.sort();
        symbols
    }
}

/// Outcome of one ranking period.
#[derive(Debug, Clone)]
pub struct RankOutcome {
    pub threshold: f64,
    pub eligible: Vec<String>,
}

/// Percentile ranker with persistence gating.
#[derive(Debug, Clone)]
pub struct Ranker {
    pub percentile: f64,
    pub persistence_floor: u32,
}

impl Default for Ranker {
    fn default() -> Self {
        Ranker {
            percentile: 0.90,
            persistence_floor: 3,
        }
    }
}

impl Ranker {
    /// Rank one period of scores: compute the percentile threshold, update
    /// every scored symbol's streak, and report the currently eligible set.
    /// `None` when no scores were supplied.
    pub fn update(
        &self,
        streaks: &mut StreakState,
        scores: &HashMap<String, f64>,
    ) -> Option<RankOutcome> {
        if scores.is_empty() {
            return None;
        }
        let values: Vec<f64> = scores.values().copied().collect();
        let threshold = quantile(&values, self.percentile)?;

        for (symbol, &score) in scores {
            let qualified = score >= threshold;
            let count = streaks.observe(symbol, qualified);
            if qualified {
                debug!(%symbol, score, count, "score above percentile threshold");
            }
        }

        Some(RankOutcome {
            threshold,
            eligible: streaks.eligible(self.persistence_floor),
        })
    }
}
