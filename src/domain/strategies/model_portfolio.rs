//! Overlay of an externally supplied model portfolio with a moving-average
//! regime carve-out.
//!
//! The latest model record is converted to long-only (short legs redirect
//! to the benchmark), a fixed anchor weight goes to the benchmark or the
//! defensive asset depending on the regime, the model weights are scaled
//! into the remaining sleeve budget, and the result is renormalized to sum
//! to one.

use tracing::info;

use crate::domain::allocation::{TargetAllocation, long_only};
use crate::domain::bar::closes;
use crate::domain::error::SignallocError;
use crate::domain::regime::{MovingAverageRegime, Regime, RegimeSplit};
use crate::domain::snapshot::MarketSnapshot;
use crate::domain::strategy::Strategy;
use crate::ports::config_source::ConfigSource;

#[derive(Debug, Clone)]
pub struct ModelPortfolioConfig {
    /// Provider key of the model-allocation series in the snapshot.
    pub provider: String,
    pub benchmark: String,
    pub defensive: String,
    pub regime: MovingAverageRegime,
    pub split: RegimeSplit,
}

impl Default for ModelPortfolioConfig {
    fn default() -> Self {
        ModelPortfolioConfig {
            provider: "model".into(),
            benchmark: "SPY".into(),
            defensive: "GLD".into(),
            regime: MovingAverageRegime::default(),
            split: RegimeSplit::default(),
        }
    }
}

#[derive(Debug)]
pub struct ModelPortfolioStrategy {
    config: ModelPortfolioConfig,
}

impl ModelPortfolioStrategy {
    pub fn new(config: ModelPortfolioConfig) -> Self {
        ModelPortfolioStrategy { config }
    }

    pub fn from_config(config: &dyn ConfigSource) -> Result<Self, SignallocError> {
        let mut cfg = ModelPortfolioConfig::default();
        if let Some(provider) = config.get_string("strategy", "provider") {
            cfg.provider = provider;
        }
        if let Some(symbol) = config.get_string("strategy", "benchmark") {
            cfg.benchmark = symbol;
        }
        if let Some(symbol) = config.get_string("strategy", "defensive") {
            cfg.defensive = symbol;
        }
        cfg.regime.window = config
            .get_int("strategy", "regime_window", cfg.regime.window as i64)
            .max(1) as usize;
        cfg.split.risk_on_anchor =
            config.get_double("strategy", "risk_on_anchor", cfg.split.risk_on_anchor);
        cfg.split.risk_on_sleeve =
            config.get_double("strategy", "risk_on_sleeve", cfg.split.risk_on_sleeve);
        cfg.split.risk_off_anchor =
            config.get_double("strategy", "risk_off_anchor", cfg.split.risk_off_anchor);
        cfg.split.risk_off_sleeve =
            config.get_double("strategy", "risk_off_sleeve", cfg.split.risk_off_sleeve);
        Ok(Self::new(cfg))
    }
}

impl Strategy for ModelPortfolioStrategy {
    fn assets(&self) -> Vec<String> {
        vec![self.config.benchmark.clone(), self.config.defensive.clone()]
    }

    fn warmup(&self) -> usize {
        self.config.regime.window
    }

    fn run(&mut self, snapshot: &MarketSnapshot) -> TargetAllocation {
        let bars = snapshot.history(&self.config.benchmark);
        if bars.len() < self.config.regime.window {
            return TargetAllocation::single(&self.config.benchmark, 1.0);
        }

        let regime = self.config.regime.evaluate(&closes(bars));
        let (anchor_weight, sleeve_budget) = self.config.split.for_regime(regime);
        let anchor_symbol = match regime {
            Regime::RiskOn => &self.config.benchmark,
            Regime::RiskOff => &self.config.defensive,
        };
        info!(?regime, anchor = %anchor_symbol, "model portfolio overlay");

        let mut alloc = TargetAllocation::new();
        alloc.set(anchor_symbol, anchor_weight);

        if let Some(record) = snapshot.model_portfolio(&self.config.provider) {
            let converted = long_only(&record.weights, &self.config.benchmark);
            let total: f64 = converted.values().sum();
            if total > 0.0 {
                for (symbol, weight) in &converted {
                    alloc.add(symbol, sleeve_budget * weight / total);
                }
            }
        }

        alloc.normalize(1.0);
        alloc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::Bar;
    use crate::domain::snapshot::ModelAllocation;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn snapshot_with_trend(len: usize, last_close: f64) -> MarketSnapshot {
        let mut snapshot = MarketSnapshot::new();
        let mut bars: Vec<Bar> = (0..len)
            .map(|i| Bar {
                symbol: "SPY".into(),
                date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
                    + chrono::Days::new(i as u64),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0,
                volume: 1_000_000,
            })
            .collect();
        let n = bars.len();
        bars[n - 1].close = last_close;
        snapshot.bars.insert("SPY".into(), bars);
        snapshot
    }

    fn with_model(mut snapshot: MarketSnapshot, weights: &[(&str, f64)]) -> MarketSnapshot {
        let record = ModelAllocation {
            date: NaiveDate::from_ymd_opt(2023, 12, 1).unwrap(),
            weights: weights
                .iter()
                .map(|(s, w)| (s.to_string(), *w))
                .collect::<HashMap<_, _>>(),
        };
        snapshot
            .model_portfolios
            .insert("model".into(), vec![record]);
        snapshot
    }

    fn test_strategy() -> ModelPortfolioStrategy {
        ModelPortfolioStrategy::new(ModelPortfolioConfig {
            regime: MovingAverageRegime { window: 100 },
            ..Default::default()
        })
    }

    #[test]
    fn short_history_defaults_to_benchmark() {
        let mut strategy = test_strategy();
        let snapshot = snapshot_with_trend(10, 100.0);
        let alloc = strategy.run(&snapshot);
        assert_relative_eq!(alloc.get("SPY"), 1.0);
    }

    #[test]
    fn risk_on_anchors_benchmark_and_scales_sleeve() {
        let mut strategy = test_strategy();
        let snapshot = with_model(
            snapshot_with_trend(150, 110.0),
            &[("AAPL", 0.6), ("MSFT", 0.2)],
        );

        let alloc = strategy.run(&snapshot);
        // anchor 0.25 SPY + sleeve 0.75 split 3:1 between AAPL and MSFT
        assert_relative_eq!(alloc.get("SPY"), 0.25, epsilon = 1e-9);
        assert_relative_eq!(alloc.get("AAPL"), 0.75 * 0.75, epsilon = 1e-9);
        assert_relative_eq!(alloc.get("MSFT"), 0.75 * 0.25, epsilon = 1e-9);
        assert_relative_eq!(alloc.total(), 1.0, epsilon = 1e-9);
        assert!(alloc.is_valid());
    }

    #[test]
    fn risk_off_anchors_defensive_asset() {
        let mut strategy = test_strategy();
        let snapshot = with_model(snapshot_with_trend(150, 90.0), &[("AAPL", 1.0)]);

        let alloc = strategy.run(&snapshot);
        assert_relative_eq!(alloc.get("GLD"), 0.5, epsilon = 1e-9);
        assert_relative_eq!(alloc.get("AAPL"), 0.5, epsilon = 1e-9);
        assert_relative_eq!(alloc.get("SPY"), 0.0);
    }

    #[test]
    fn short_legs_redirect_to_benchmark() {
        let mut strategy = test_strategy();
        let snapshot = with_model(
            snapshot_with_trend(150, 110.0),
            &[("AAPL", 0.5), ("TSLA", -0.5)],
        );

        let alloc = strategy.run(&snapshot);
        // converted model: AAPL 0.5, SPY 0.5 → sleeve splits evenly, on top
        // of the 0.25 SPY anchor
        assert_relative_eq!(alloc.get("AAPL"), 0.375, epsilon = 1e-9);
        assert_relative_eq!(alloc.get("SPY"), 0.25 + 0.375, epsilon = 1e-9);
        assert!(alloc.get("TSLA") == 0.0);
        assert_relative_eq!(alloc.total(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn missing_model_series_leaves_anchor_only() {
        let mut strategy = test_strategy();
        let snapshot = snapshot_with_trend(150, 110.0);

        let alloc = strategy.run(&snapshot);
        // lone anchor renormalizes to the full book
        assert_relative_eq!(alloc.get("SPY"), 1.0);
    }

    #[test]
    fn allocation_always_sums_to_one_with_model_present() {
        let mut strategy = test_strategy();
        for &last in &[90.0, 110.0] {
            let snapshot = with_model(
                snapshot_with_trend(150, last),
                &[("AAPL", 0.4), ("MSFT", 0.4), ("TSLA", -0.2)],
            );
            let alloc = strategy.run(&snapshot);
            assert_relative_eq!(alloc.total(), 1.0, epsilon = 1e-9);
            assert!(alloc.is_valid());
        }
    }
}
