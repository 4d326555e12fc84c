//! Risk-management overlay: ATR stop-loss and progressive profit-taking.
//!
//! Evaluated every invocation regardless of rebalance cadence, and always
//! ahead of cadence-gated entries for the same asset in the same period.
//! Per-asset lifecycle: unheld → held on entry; held → trimmed on a partial
//! profit tier; held/trimmed → unheld on stop-loss, full profit-take, or
//! eligibility loss. Trims are edge-triggered: each tier fires at most
//! once per holding.

use chrono::NaiveDate;
use std::collections::HashMap;

use tracing::info;

use crate::domain::bar::Bar;
use crate::domain::rolling::atr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldingPhase {
    Held,
    Trimmed,
}

/// Entry bookkeeping for one held asset.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingRecord {
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub phase: HoldingPhase,
    /// Highest profit tier already taken, if any.
    pub taken_tier: Option<usize>,
}

impl HoldingRecord {
    pub fn new(entry_price: f64, entry_date: NaiveDate) -> Self {
        HoldingRecord {
            entry_price,
            entry_date,
            phase: HoldingPhase::Held,
            taken_tier: None,
        }
    }
}

/// The set of open holding records, owned by a strategy instance across
/// invocations. Constructible empty.
#[derive(Debug, Clone, Default)]
pub struct HoldingBook {
    records: HashMap<String, HoldingRecord>,
}

impl HoldingBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self, symbol: &str, price: f64, date: NaiveDate) {
        self.records
            .entry(symbol.to_string())
            .or_insert_with(|| HoldingRecord::new(price, date));
    }

    pub fn exit(&mut self, symbol: &str) -> Option<HoldingRecord> {
        self.records.remove(symbol)
    }

    pub fn get(&self, symbol: &str) -> Option<&HoldingRecord> {
        self.records.get(symbol)
    }

    pub fn get_mut(&mut self, symbol: &str) -> Option<&mut HoldingRecord> {
        self.records.get_mut(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.records.contains_key(symbol)
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.records.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Ascending profit tiers: (gain threshold, fraction to trim).
#[derive(Debug, Clone)]
pub struct ProfitLadder {
    pub tiers: Vec<(f64, f64)>,
    pub full_exit_gain: f64,
}

impl Default for ProfitLadder {
    fn default() -> Self {
        ProfitLadder {
            tiers: vec![(0.10, 0.15), (0.15, 0.25), (0.25, 0.35)],
            full_exit_gain: 0.35,
        }
    }
}

impl ProfitLadder {
    /// Highest tier index whose threshold the gain has crossed.
    fn highest_crossed(&self, gain: f64) -> Option<usize> {
        self.tiers
            .iter()
            .enumerate()
            .filter(|(_, (threshold, _))| gain >= *threshold)
            .map(|(i, _)| i)
            .next_back()
    }
}

/// Decision of one risk evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RiskAction {
    Keep,
    /// Scale the current weight by (1 - fraction) and mark the tier taken.
    Trim { tier: usize, fraction: f64 },
    StopLoss,
    FullProfitExit,
}

/// Stop-loss and profit-taking rules.
#[derive(Debug, Clone)]
pub struct RiskOverlay {
    pub atr_period: usize,
    /// Stop when price has fallen more than this fraction of the ATR below
    /// entry.
    pub stop_atr_fraction: f64,
    pub ladder: ProfitLadder,
}

impl Default for RiskOverlay {
    fn default() -> Self {
        RiskOverlay {
            atr_period: 14,
            stop_atr_fraction: 0.10,
            ladder: ProfitLadder::default(),
        }
    }
}

impl RiskOverlay {
    /// Evaluate one holding against the latest bar history. The stop-loss
    /// is checked first; a full profit exit always wins over a trim, even
    /// when intermediate tiers were skipped in one step.
    pub fn evaluate(&self, record: &HoldingRecord, bars: &[Bar]) -> RiskAction {
        let Some(last) = bars.last() else {
            return RiskAction::Keep;
        };
        let price = last.close;
        let entry = record.entry_price;

        let atr_value = atr(bars, self.atr_period)
            .last()
            .copied()
            .flatten()
            .unwrap_or(0.0);
        if price - entry < -self.stop_atr_fraction * atr_value {
            return RiskAction::StopLoss;
        }

        if entry <= 0.0 {
            return RiskAction::Keep;
        }
        let gain = (price - entry) / entry;
        if gain >= self.ladder.full_exit_gain {
            return RiskAction::FullProfitExit;
        }

        match self.ladder.highest_crossed(gain) {
            Some(tier) if record.taken_tier.is_none_or(|taken| tier > taken) => {
                RiskAction::Trim {
                    tier,
                    fraction: self.ladder.tiers[tier].1,
                }
            }
            _ => RiskAction::Keep,
        }
    }

    /// Run the overlay over every symbol in the book, applying phase
    /// transitions: exits are removed from the book, trims are marked.
    /// Returns exited symbols and (symbol → keep fraction) for trims.
    pub fn apply(
        &self,
        book: &mut HoldingBook,
        history: impl Fn(&str) -> Vec<Bar>,
    ) -> RiskReport {
        let mut exits = Vec::new();
        let mut trims = HashMap::new();

        for symbol in book.symbols() {
            let bars = history(&symbol);
            let Some(record) = book.get(&symbol) else {
                continue;
            };
            match self.evaluate(record, &bars) {
                RiskAction::Keep => {}
                RiskAction::StopLoss => {
                    info!(%symbol, entry = record.entry_price, "stop loss triggered");
                    book.exit(&symbol);
                    exits.push(symbol);
                }
                RiskAction::FullProfitExit => {
                    info!(%symbol, entry = record.entry_price, "full profit exit");
                    book.exit(&symbol);
                    exits.push(symbol);
                }
                RiskAction::Trim { tier, fraction } => {
                    info!(%symbol, tier, fraction, "profit-taking trim");
                    if let Some(record) = book.get_mut(&symbol) {
                        record.taken_tier = Some(tier);
                        record.phase = HoldingPhase::Trimmed;
                    }
                    trims.insert(symbol, 1.0 - fraction);
                }
            }
        }

        exits.sort();
        RiskReport { exits, trims }
    }
}

/// Exits and trims produced by one overlay pass.
#[derive(Debug, Clone, Default)]
pub struct RiskReport {
    pub exits: Vec<String>,
    /// symbol → fraction of the current weight to keep.
    pub trims: HashMap<String, f64>,
}
