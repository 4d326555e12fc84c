//! Momentum ranking across a small risk-asset set.
//!
//! Each risk asset gets a blended TSI score appended to its process-state
//! history; assets are ranked by smoothed score and score rate-of-change.
//! The top asset's exposure is stepped by a Keltner-style envelope on its
//! own score history, gated by an Ichimoku-baseline regime check, with the
//! remainder parked in the safe asset.

use std::collections::HashMap;

use tracing::info;

use crate::domain::allocation::TargetAllocation;
use crate::domain::bar::closes;
use crate::domain::error::SignallocError;
use crate::domain::momentum::{MomentumConfig, ScoreHistory, exposure_ladder};
use crate::domain::regime::IchimokuRegime;
use crate::domain::snapshot::MarketSnapshot;
use crate::domain::strategy::Strategy;
use crate::ports::config_source::ConfigSource;

#[derive(Debug, Clone)]
pub struct MomentumRankConfig {
    pub risk_symbols: Vec<String>,
    pub safe_symbol: String,
    pub momentum: MomentumConfig,
    pub regime: IchimokuRegime,
    pub warmup: usize,
}

impl Default for MomentumRankConfig {
    fn default() -> Self {
        MomentumRankConfig {
            risk_symbols: vec!["SPY".into(), "QQQ".into(), "TLT".into(), "IEF".into()],
            safe_symbol: "BIL".into(),
            momentum: MomentumConfig::default(),
            regime: IchimokuRegime::default(),
            warmup: 252,
        }
    }
}

#[derive(Debug)]
pub struct MomentumRankStrategy {
    config: MomentumRankConfig,
    histories: HashMap<String, ScoreHistory>,
    last_alloc: TargetAllocation,
}

impl MomentumRankStrategy {
    pub fn new(config: MomentumRankConfig) -> Self {
        let last_alloc = TargetAllocation::single(&config.safe_symbol, 1.0);
        MomentumRankStrategy {
            config,
            histories: HashMap::new(),
            last_alloc,
        }
    }

    pub fn from_config(config: &dyn ConfigSource) -> Result<Self, SignallocError> {
        let mut cfg = MomentumRankConfig::default();
        if let Some(symbols) = config.get_string("strategy", "risk_symbols") {
            cfg.risk_symbols = crate::domain::universe::parse_symbols(&symbols).map_err(|e| {
                SignallocError::ConfigInvalid {
                    section: "strategy".into(),
                    key: "risk_symbols".into(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(symbol) = config.get_string("strategy", "safe_symbol") {
            cfg.safe_symbol = symbol;
        }
        cfg.warmup = config.get_int("strategy", "warmup", cfg.warmup as i64).max(0) as usize;
        cfg.regime.window = config
            .get_int("strategy", "regime_window", cfg.regime.window as i64)
            .max(1) as usize;
        Ok(Self::new(cfg))
    }
}

impl Strategy for MomentumRankStrategy {
    fn assets(&self) -> Vec<String> {
        let mut assets = self.config.risk_symbols.clone();
        assets.push(self.config.safe_symbol.clone());
        assets
    }

    fn warmup(&self) -> usize {
        self.config.warmup
    }

    fn run(&mut self, snapshot: &MarketSnapshot) -> TargetAllocation {
        let longest = self
            .config
            .risk_symbols
            .iter()
            .map(|symbol| snapshot.history(symbol).len())
            .max()
            .unwrap_or(0);
        if longest < self.config.warmup {
            return self.last_alloc.clone();
        }

        let momentum = &self.config.momentum;
        let mut scores: HashMap<String, f64> = HashMap::new();
        let mut rocs: HashMap<String, f64> = HashMap::new();
        let mut regime_pass: HashMap<String, bool> = HashMap::new();

        for symbol in &self.config.risk_symbols {
            let bars = snapshot.history(symbol);
            let Some(raw) = momentum.blended_score(&closes(bars)) else {
                continue;
            };
            let history = self.histories.entry(symbol.clone()).or_default();
            history.push(raw);

            let Some(smoothed) = history.smoothed(momentum.smoothing_window) else {
                continue;
            };
            scores.insert(symbol.clone(), smoothed);
            rocs.insert(
                symbol.clone(),
                history.rate_of_change(momentum.roc_span).unwrap_or(0.0),
            );
            regime_pass.insert(symbol.clone(), self.config.regime.passes(bars));
        }

        if scores.is_empty() {
            let alloc = TargetAllocation::single(&self.config.safe_symbol, 1.0);
            self.last_alloc = alloc.clone();
            return alloc;
        }

        // rank by smoothed score, rate-of-change as the tiebreaker
        let mut ranked: Vec<&String> = scores.keys().collect();
        ranked.sort_by(|a, b| {
            let key_a = (scores[*a], rocs[*a]);
            let key_b = (scores[*b], rocs[*b]);
            key_b
                .partial_cmp(&key_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.cmp(b))
        });
        let top = ranked[0].clone();

        let history = &self.histories[&top];
        let Some(band) = history.band(momentum.band_window, momentum.band_mult) else {
            return self.last_alloc.clone();
        };
        let support = history.support(momentum.support_quantile, momentum.support_min_obs);

        let exposure = if regime_pass.get(&top).copied().unwrap_or(false) {
            exposure_ladder(scores[&top], band, support)
        } else {
            0.0
        };
        info!(symbol = %top, score = scores[&top], exposure, "momentum rank");

        let mut alloc = TargetAllocation::new();
        alloc.set(&top, exposure);
        alloc.set(&self.config.safe_symbol, 1.0 - exposure);
        self.last_alloc = alloc.clone();
        alloc
    }
}
