//! Universe rotation on fundamental surprise scores.
//!
//! Every invocation runs the risk overlay over held assets; on the
//! rebalance cadence the liquid universe is scored by the surprise
//! composer, ranked against the 90th percentile with streak gating, and
//! the book is reallocated proportional to score. Off-cadence invocations
//! return the cached allocation with risk exits and trims applied.

use std::collections::{BTreeSet, HashMap};

use tracing::info;

use crate::domain::allocation::{TargetAllocation, proportional};
use crate::domain::error::SignallocError;
use crate::domain::fundamentals::{SurpriseScore, SurpriseScorer, valuation_drift};
use crate::domain::ranking::{LiquidityFilter, Ranker, StreakState};
use crate::domain::risk::{HoldingBook, RiskOverlay, RiskReport};
use crate::domain::rolling::atr;
use crate::domain::snapshot::MarketSnapshot;
use crate::domain::strategy::{Cadence, CadenceClock, Strategy};
use crate::ports::config_source::ConfigSource;

#[derive(Debug, Clone)]
pub struct FundamentalRotationConfig {
    pub universe: Vec<String>,
    pub rebalance_interval: u32,
    pub liquidity: LiquidityFilter,
    pub ranker: Ranker,
    pub scorer: SurpriseScorer,
    pub risk: RiskOverlay,
    /// Drop held assets whose valuation drift falls below the percentile
    /// threshold while both surprise scores are negative.
    pub drop_deteriorated: bool,
}

impl Default for FundamentalRotationConfig {
    fn default() -> Self {
        FundamentalRotationConfig {
            universe: Vec::new(),
            rebalance_interval: 30,
            liquidity: LiquidityFilter::default(),
            ranker: Ranker::default(),
            scorer: SurpriseScorer::default(),
            risk: RiskOverlay::default(),
            drop_deteriorated: true,
        }
    }
}

#[derive(Debug)]
pub struct FundamentalRotationStrategy {
    config: FundamentalRotationConfig,
    book: HoldingBook,
    streaks: StreakState,
    clock: CadenceClock,
    base_prices: HashMap<String, f64>,
    last_alloc: TargetAllocation,
}

impl FundamentalRotationStrategy {
    pub fn new(config: FundamentalRotationConfig) -> Self {
        let clock = CadenceClock::new(Cadence::EveryNBars(config.rebalance_interval));
        FundamentalRotationStrategy {
            config,
            book: HoldingBook::new(),
            streaks: StreakState::new(),
            clock,
            base_prices: HashMap::new(),
            last_alloc: TargetAllocation::new(),
        }
    }

    pub fn from_config(config: &dyn ConfigSource) -> Result<Self, SignallocError> {
        let symbols = config
            .get_string("strategy", "symbols")
            .ok_or_else(|| SignallocError::ConfigMissing {
                section: "strategy".into(),
                key: "symbols".into(),
            })?;
        let universe =
            crate::domain::universe::parse_symbols(&symbols).map_err(|e| {
                SignallocError::ConfigInvalid {
                    section: "strategy".into(),
                    key: "symbols".into(),
                    reason: e.to_string(),
                }
            })?;

        let mut cfg = FundamentalRotationConfig {
            universe,
            ..Default::default()
        };
        cfg.rebalance_interval = config
            .get_int("strategy", "rebalance_interval", 30)
            .max(1) as u32;
        cfg.liquidity.min_dollar_volume = config.get_double(
            "strategy",
            "min_dollar_volume",
            cfg.liquidity.min_dollar_volume,
        );
        cfg.ranker.percentile =
            config.get_double("strategy", "percentile", cfg.ranker.percentile);
        cfg.ranker.persistence_floor = config
            .get_int("strategy", "persistence_floor", 3)
            .max(1) as u32;
        cfg.drop_deteriorated =
            config.get_bool("strategy", "drop_deteriorated", cfg.drop_deteriorated);
        Ok(Self::new(cfg))
    }

    /// Drop book records the engine reports as no longer held.
    fn reconcile_holdings(&mut self, snapshot: &MarketSnapshot) {
        if !snapshot.has_holdings() {
            return;
        }
        for symbol in self.book.symbols() {
            if snapshot.held(&symbol) <= 0.0 {
                self.book.exit(&symbol);
            }
        }
    }

    /// Cached allocation with this period's risk exits and trims applied.
    fn carry_forward(&mut self, report: &RiskReport) -> TargetAllocation {
        let mut alloc = self.last_alloc.clone();
        for symbol in &report.exits {
            alloc.remove(symbol);
        }
        for (symbol, keep) in &report.trims {
            alloc.scale(symbol, *keep);
        }
        self.last_alloc = alloc.clone();
        alloc
    }

    fn drop_deteriorated_holdings(
        &mut self,
        snapshot: &MarketSnapshot,
        scores: &HashMap<String, SurpriseScore>,
        threshold: f64,
        candidates: &mut BTreeSet<String>,
    ) {
        for symbol in self.book.symbols() {
            let Some(price) = snapshot.last_close(&symbol) else {
                continue;
            };
            let base = *self.base_prices.entry(symbol.clone()).or_insert(price);
            let bars = snapshot.history(&symbol);
            let atr_value = atr(bars, self.config.risk.atr_period)
                .last()
                .copied()
                .flatten()
                .unwrap_or(0.0);
            let drift =
                valuation_drift(snapshot.valuations_for(&symbol), base, price, atr_value);
            let best_side = scores
                .get(&symbol)
                .map(|s| s.expected.max(s.trailing))
                .unwrap_or(0.0);
            if drift < threshold && best_side < 0.0 {
                info!(%symbol, drift, threshold, "fundamental deterioration exit");
                self.book.exit(&symbol);
                candidates.remove(&symbol);
            }
        }
    }
}

impl Strategy for FundamentalRotationStrategy {
    fn assets(&self) -> Vec<String> {
        self.config.universe.clone()
    }

    fn warmup(&self) -> usize {
        self.config.liquidity.lookback.max(self.config.risk.atr_period)
    }

    fn run(&mut self, snapshot: &MarketSnapshot) -> TargetAllocation {
        if snapshot.bars.is_empty() {
            return TargetAllocation::new();
        }
        let Some(date) = snapshot.current_date() else {
            return self.last_alloc.clone();
        };

        // risk management runs every period, ahead of any entries
        self.reconcile_holdings(snapshot);
        let report = self
            .config
            .risk
            .apply(&mut self.book, |symbol| snapshot.history(symbol).to_vec());

        if !self.clock.tick(date) {
            return self.carry_forward(&report);
        }

        let liquid: Vec<&String> = self
            .config
            .universe
            .iter()
            .filter(|symbol| self.config.liquidity.is_liquid(snapshot.history(symbol)))
            .collect();
        info!(
            liquid = liquid.len(),
            universe = self.config.universe.len(),
            "rebalance scan"
        );

        let mut scores: HashMap<String, SurpriseScore> = HashMap::new();
        for symbol in liquid {
            if let Some(score) = self
                .config
                .scorer
                .score(snapshot.earnings_for(symbol), snapshot.estimates_for(symbol))
            {
                scores.insert(symbol.clone(), score);
            }
        }
        let combined: HashMap<String, f64> = scores
            .iter()
            .map(|(symbol, score)| (symbol.clone(), score.combined))
            .collect();

        let Some(outcome) = self.config.ranker.update(&mut self.streaks, &combined) else {
            return self.carry_forward(&report);
        };

        // candidates: still-held assets plus newly eligible entries, minus
        // anything the risk overlay exited this period
        let mut candidates: BTreeSet<String> = self.book.symbols().into_iter().collect();
        candidates.extend(outcome.eligible.iter().cloned());
        for symbol in &report.exits {
            candidates.remove(symbol);
        }

        if self.config.drop_deteriorated {
            self.drop_deteriorated_holdings(
                snapshot,
                &scores,
                outcome.threshold,
                &mut candidates,
            );
        }

        let alloc_scores: HashMap<String, f64> = candidates
            .iter()
            .map(|symbol| (symbol.clone(), combined.get(symbol).copied().unwrap_or(0.0)))
            .collect();
        let mut alloc = proportional(&alloc_scores, 1.0);

        let entered: Vec<String> = alloc.symbols().cloned().collect();
        for symbol in entered {
            if !self.book.contains(&symbol) {
                if let Some(price) = snapshot.last_close(&symbol) {
                    info!(%symbol, price, "entering position");
                    self.book.enter(&symbol, price, date);
                }
            }
        }

        for (symbol, keep) in &report.trims {
            alloc.scale(symbol, *keep);
        }
        alloc.normalize(1.0);

        self.last_alloc = alloc.clone();
        alloc
    }
}
