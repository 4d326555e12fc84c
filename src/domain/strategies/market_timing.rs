//! Single-asset market timing: composite trend score against a safe asset.
//!
//! Scores the risk symbol with the composite trend scorer on a weekly
//! cadence and splits the book between the risk and safe symbols by the
//! smoothed score's allocation fraction. Off-cadence and warmup
//! invocations return the cached last allocation.

use chrono::{Datelike, Weekday};

use tracing::info;

use crate::domain::allocation::TargetAllocation;
use crate::domain::bar::closes;
use crate::domain::error::SignallocError;
use crate::domain::score::{CompositeScorer, ScoreState, score_to_fraction};
use crate::domain::snapshot::MarketSnapshot;
use crate::domain::strategy::Strategy;
use crate::ports::config_source::ConfigSource;

#[derive(Debug, Clone)]
pub struct MarketTimingConfig {
    pub risk_symbol: String,
    pub safe_symbol: String,
    pub rebalance_day: Weekday,
    pub warmup: usize,
    pub scorer: CompositeScorer,
}

impl Default for MarketTimingConfig {
    fn default() -> Self {
        MarketTimingConfig {
            risk_symbol: "SPY".into(),
            safe_symbol: "BIL".into(),
            rebalance_day: Weekday::Tue,
            warmup: 175,
            scorer: CompositeScorer::default(),
        }
    }
}

#[derive(Debug)]
pub struct MarketTimingStrategy {
    config: MarketTimingConfig,
    score_state: ScoreState,
    last_alloc: TargetAllocation,
}

impl MarketTimingStrategy {
    pub fn new(config: MarketTimingConfig) -> Self {
        let last_alloc = TargetAllocation::single(&config.safe_symbol, 1.0);
        MarketTimingStrategy {
            config,
            score_state: ScoreState::new(),
            last_alloc,
        }
    }

    pub fn from_config(config: &dyn ConfigSource) -> Result<Self, SignallocError> {
        let mut cfg = MarketTimingConfig::default();
        if let Some(symbol) = config.get_string("strategy", "risk_symbol") {
            cfg.risk_symbol = symbol;
        }
        if let Some(symbol) = config.get_string("strategy", "safe_symbol") {
            cfg.safe_symbol = symbol;
        }
        if let Some(day) = config.get_string("strategy", "rebalance_day") {
            cfg.rebalance_day =
                day.parse()
                    .map_err(|_| SignallocError::ConfigInvalid {
                        section: "strategy".into(),
                        key: "rebalance_day".into(),
                        reason: format!("unrecognized weekday: {day}"),
                    })?;
        }
        let warmup = config.get_int("strategy", "warmup", cfg.warmup as i64);
        cfg.warmup = warmup.max(0) as usize;
        cfg.scorer.smoothing_window = config
            .get_int("strategy", "smoothing_window", 10)
            .max(1) as usize;
        Ok(Self::new(cfg))
    }
}

impl Strategy for MarketTimingStrategy {
    fn assets(&self) -> Vec<String> {
        vec![
            self.config.risk_symbol.clone(),
            self.config.safe_symbol.clone(),
        ]
    }

    fn warmup(&self) -> usize {
        self.config.warmup
    }

    fn run(&mut self, snapshot: &MarketSnapshot) -> TargetAllocation {
        let bars = snapshot.history(&self.config.risk_symbol);
        if bars.len() < self.config.warmup {
            return self.last_alloc.clone();
        }

        let today = bars[bars.len() - 1].date;
        if today.weekday() != self.config.rebalance_day {
            return self.last_alloc.clone();
        }

        let closes = closes(bars);
        let smoothed = self.config.scorer.update(&mut self.score_state, &closes);

        // two-decimal rounding keeps the weight stable across tiny score
        // wobbles between weeks
        let risk_weight = (score_to_fraction(smoothed) * 100.0).round() / 100.0;
        info!(
            symbol = %self.config.risk_symbol,
            score = smoothed,
            weight = risk_weight,
            "weekly rebalance"
        );

        let mut alloc = TargetAllocation::new();
        alloc.set(&self.config.risk_symbol, risk_weight);
        alloc.set(&self.config.safe_symbol, 1.0 - risk_weight);
        self.last_alloc = alloc.clone();
        alloc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::Bar;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn snapshot_with_closes(symbol: &str, closes: &[f64]) -> MarketSnapshot {
        let mut snapshot = MarketSnapshot::new();
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                symbol: symbol.to_string(),
                // start on a Monday so weekday cycling is predictable
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Days::new(i as u64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000_000,
            })
            .collect();
        snapshot.bars.insert(symbol.to_string(), bars);
        snapshot
    }

    fn tuesday_history(len: usize) -> Vec<f64> {
        (0..len).map(|i| 100.0 + (i as f64) * 0.01).collect()
    }

    fn last_bar_date(len: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new((len - 1) as u64)
    }

    /// Pop bars until the history ends on a Tuesday.
    fn trim_to_tuesday(history: &mut Vec<f64>) {
        while last_bar_date(history.len()).weekday() != Weekday::Tue {
            history.pop();
        }
    }

    #[test]
    fn warmup_returns_all_safe() {
        let mut strategy = MarketTimingStrategy::new(MarketTimingConfig::default());
        let snapshot = snapshot_with_closes("SPY", &tuesday_history(50));

        let alloc = strategy.run(&snapshot);
        assert_relative_eq!(alloc.get("BIL"), 1.0);
        assert_relative_eq!(alloc.get("SPY"), 0.0);
    }

    #[test]
    fn off_cadence_returns_cached_allocation() {
        let mut strategy = MarketTimingStrategy::new(MarketTimingConfig::default());
        // check that a non-Tuesday run leaves the cache untouched
        let mut history = tuesday_history(200);
        let snapshot = snapshot_with_closes("SPY", &history);
        let last_date = snapshot.history("SPY").last().unwrap().date;

        let alloc = strategy.run(&snapshot);
        if last_date.weekday() != Weekday::Tue {
            assert_relative_eq!(alloc.get("BIL"), 1.0);
        }

        // trim history until the last bar is a Tuesday, then expect a split
        trim_to_tuesday(&mut history);
        let snapshot = snapshot_with_closes("SPY", &history);
        let alloc = strategy.run(&snapshot);
        assert_relative_eq!(alloc.get("SPY") + alloc.get("BIL"), 1.0, epsilon = 1e-9);
        assert!(alloc.is_valid());
    }

    #[test]
    fn identical_input_and_state_gives_identical_output() {
        let mut history = tuesday_history(200);
        trim_to_tuesday(&mut history);
        let snapshot = snapshot_with_closes("SPY", &history);

        let mut a = MarketTimingStrategy::new(MarketTimingConfig::default());
        let mut b = MarketTimingStrategy::new(MarketTimingConfig::default());
        assert_eq!(a.run(&snapshot), b.run(&snapshot));
    }

    #[test]
    fn weights_always_complementary() {
        let mut strategy = MarketTimingStrategy::new(MarketTimingConfig {
            warmup: 10,
            ..Default::default()
        });
        for len in [20usize, 40, 60, 80] {
            let mut history = tuesday_history(len);
            trim_to_tuesday(&mut history);
            let snapshot = snapshot_with_closes("SPY", &history);
            let alloc = strategy.run(&snapshot);
            assert!(alloc.is_valid());
            assert_relative_eq!(
                alloc.get("SPY") + alloc.get("BIL"),
                1.0,
                epsilon = 1e-9
            );
        }
    }
}
